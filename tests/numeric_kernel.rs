//! Exercises the numeric kernel directly (spec §4.2): exact arithmetic,
//! division-by-zero/infinity conventions, and polar comparison order.

use mlab_eval::{Complex, NumericContext, Real};

fn ctx() -> NumericContext {
    NumericContext::default()
}

#[test]
fn addition_is_exact_on_finite_values() {
    let a = Complex::from_i64(2);
    let b = Complex::from_i64(3);
    let sum = a.add(&b, &ctx());
    assert_eq!(sum.re.to_f64(), 5.0);
    assert!(sum.im.is_zero());
}

#[test]
fn nonzero_divided_by_zero_is_signed_infinity() {
    let c = ctx();
    let pos = Real::from_i64(5).div(&Real::zero(), &c);
    assert!(matches!(pos, Real::PosInf));
    let neg = Real::from_i64(-5).div(&Real::zero(), &c);
    assert!(matches!(neg, Real::NegInf));
}

#[test]
fn zero_divided_by_zero_is_nan() {
    let c = ctx();
    let r = Real::zero().div(&Real::zero(), &c);
    assert!(r.is_nan());
}

#[test]
fn complex_division_by_zero_denominator_follows_signed_infinity_rule() {
    let c = ctx();
    let numerator = Complex::from_i64(4);
    let zero = Complex::zero();
    let q = numerator.div_right(&zero, &c);
    assert!(q.re.is_infinite());
}

#[test]
fn polar_comparison_orders_by_magnitude_first() {
    let c = ctx();
    // 3 has magnitude 3, i has magnitude 1; 3 > i under polar order.
    let three = Complex::from_i64(3);
    let i = Complex { re: Real::zero(), im: Real::one() };
    assert_eq!(three.cmp_polar(&i, &c), std::cmp::Ordering::Greater);
}

#[test]
fn real_only_comparison_short_circuits_to_usual_order() {
    let c = ctx();
    let a = Complex::from_i64(-10);
    let b = Complex::from_i64(2);
    assert_eq!(a.cmp_polar(&b, &c), std::cmp::Ordering::Less);
}

#[test]
fn floor_and_ceil_bracket_a_negative_fraction() {
    let c = Complex::real(Real::from_f64(-1.5, &ctx()));
    assert_eq!(c.floor().re.to_f64(), -2.0);
    assert_eq!(c.ceil().re.to_f64(), -1.0);
}

#[test]
fn factorial_of_a_non_negative_integer_matches_the_closed_form() {
    let c = ctx();
    let five = Complex::from_i64(5);
    let f = five.factorial(&c).expect("factorial of 5 is defined");
    assert!((f.re.to_f64() - 120.0).abs() < 1e-6);
}

#[test]
fn factorial_of_a_negative_number_is_undefined() {
    let c = ctx();
    let neg = Complex::from_i64(-1);
    assert!(neg.factorial(&c).is_none());
}

#[test]
fn sqrt_of_a_negative_real_is_imaginary() {
    let c = ctx();
    let neg_four = Complex::from_i64(-4);
    let root = neg_four.sqrt(&c);
    assert!(root.re.to_f64().abs() < 1e-6);
    assert!((root.im.to_f64() - 2.0).abs() < 1e-6);
}
