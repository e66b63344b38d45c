//! Arbitrary-precision complex numeric kernel (spec §4.2).
//!
//! A scalar's real and imaginary components are each either a finite
//! arbitrary-precision decimal (`BigDecimal`) or one of the three IEEE-style
//! specials (`+Inf`, `-Inf`, `NaN`) that the spec requires division and the
//! elementary functions to propagate. Exact operations (`+ - × ÷`,
//! comparisons, `floor/ceil/round/fix`, `sign`, `conj`) stay on `BigDecimal`
//! throughout. Transcendental functions (`sqrt exp log` trig/hyperbolic and
//! their inverses, `gamma`) are evaluated by bridging through `f64`, then
//! re-widened to the working precision; see `DESIGN.md` for why this
//! crate does not carry a from-scratch arbitrary-precision transcendental
//! series.
//!
//! Precision is a field on `NumericContext`, not process-global state (spec
//! §9 "Global decimal-library state"): two `Evaluator`s can run with
//! different contexts without interfering with each other.

use std::cmp::Ordering;
use std::fmt;

use bigdecimal::{BigDecimal, Zero};
use num_bigint::Sign;
use num_traits::ToPrimitive;

/// Working precision and display precision, instance-scoped (spec §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericContext {
    /// Significant digits kept by intermediate computation. Default 336.
    pub working_precision: u64,
    /// Guard band subtracted from `working_precision` before comparison or
    /// rendering. Default 7.
    pub guard_digits: u64,
    /// Exponent below which scientific notation is used when rendering.
    pub sci_lower_exp: i64,
    /// Exponent at or above which scientific notation is used when rendering.
    pub sci_upper_exp: i64,
}

impl Default for NumericContext {
    fn default() -> Self {
        Self {
            working_precision: 336,
            guard_digits: 7,
            sci_lower_exp: -7,
            sci_upper_exp: 20,
        }
    }
}

impl NumericContext {
    pub fn display_precision(&self) -> u64 {
        self.working_precision.saturating_sub(self.guard_digits)
    }

    fn round_working(&self, v: BigDecimal) -> BigDecimal {
        if v.is_zero() { v } else { v.with_prec(self.working_precision) }
    }

    fn round_display(&self, v: &BigDecimal) -> BigDecimal {
        if v.is_zero() {
            v.clone()
        } else {
            v.with_prec(self.display_precision())
        }
    }
}

/// One real or imaginary component: a finite arbitrary-precision decimal, or
/// one of the IEEE-style specials the spec's division/elementary-function
/// rules require.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Real {
    Finite(BigDecimal),
    PosInf,
    NegInf,
    NaN,
}

impl Real {
    pub fn zero() -> Self {
        Real::Finite(BigDecimal::from(0))
    }

    pub fn one() -> Self {
        Real::Finite(BigDecimal::from(1))
    }

    pub fn from_i64(v: i64) -> Self {
        Real::Finite(BigDecimal::from(v))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Real::Finite(b) if b.is_zero())
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Real::NaN)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Real::PosInf | Real::NegInf)
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Real::Finite(b) => b.sign() == Sign::Minus,
            Real::NegInf => true,
            Real::PosInf | Real::NaN => false,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Real::Finite(b) => b.to_f64().unwrap_or(f64::NAN),
            Real::PosInf => f64::INFINITY,
            Real::NegInf => f64::NEG_INFINITY,
            Real::NaN => f64::NAN,
        }
    }

    pub fn from_f64(x: f64, ctx: &NumericContext) -> Self {
        if x.is_nan() {
            Real::NaN
        } else if x.is_infinite() {
            if x > 0.0 { Real::PosInf } else { Real::NegInf }
        } else {
            match BigDecimal::try_from(x) {
                Ok(b) => Real::Finite(ctx.round_working(b)),
                Err(_) => Real::NaN,
            }
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Real::Finite(b) => Real::Finite(-b),
            Real::PosInf => Real::NegInf,
            Real::NegInf => Real::PosInf,
            Real::NaN => Real::NaN,
        }
    }

    pub fn abs(&self) -> Self {
        match self {
            Real::Finite(b) => Real::Finite(b.abs()),
            Real::PosInf | Real::NegInf => Real::PosInf,
            Real::NaN => Real::NaN,
        }
    }

    pub fn add(&self, other: &Real, ctx: &NumericContext) -> Self {
        match (self, other) {
            (Real::NaN, _) | (_, Real::NaN) => Real::NaN,
            (Real::PosInf, Real::NegInf) | (Real::NegInf, Real::PosInf) => Real::NaN,
            (Real::PosInf, _) | (_, Real::PosInf) => Real::PosInf,
            (Real::NegInf, _) | (_, Real::NegInf) => Real::NegInf,
            (Real::Finite(a), Real::Finite(b)) => Real::Finite(ctx.round_working(a + b)),
        }
    }

    pub fn sub(&self, other: &Real, ctx: &NumericContext) -> Self {
        self.add(&other.neg(), ctx)
    }

    pub fn mul(&self, other: &Real, ctx: &NumericContext) -> Self {
        match (self, other) {
            (Real::NaN, _) | (_, Real::NaN) => Real::NaN,
            (Real::Finite(a), Real::Finite(b)) => Real::Finite(ctx.round_working(a * b)),
            (inf @ (Real::PosInf | Real::NegInf), Real::Finite(b)) | (Real::Finite(b), inf @ (Real::PosInf | Real::NegInf)) => {
                if b.is_zero() {
                    Real::NaN
                } else if b.sign() == Sign::Minus {
                    inf.neg()
                } else {
                    inf.clone()
                }
            }
            (a, b) => {
                let same_sign = matches!((a, b), (Real::PosInf, Real::PosInf) | (Real::NegInf, Real::NegInf));
                if same_sign { Real::PosInf } else { Real::NegInf }
            }
        }
    }

    /// `self / other`, following spec §4.2's division-by-zero and infinity
    /// conventions.
    pub fn div(&self, other: &Real, ctx: &NumericContext) -> Self {
        match (self, other) {
            (Real::NaN, _) | (_, Real::NaN) => Real::NaN,
            (Real::Finite(a), Real::Finite(b)) => {
                if b.is_zero() {
                    if a.is_zero() {
                        Real::NaN
                    } else if a.sign() == Sign::Minus {
                        Real::NegInf
                    } else {
                        Real::PosInf
                    }
                } else {
                    Real::Finite(ctx.round_working(a / b))
                }
            }
            (Real::Finite(_), Real::PosInf | Real::NegInf) => Real::zero(),
            (inf @ (Real::PosInf | Real::NegInf), Real::Finite(b)) => {
                if b.sign() == Sign::Minus {
                    inf.neg()
                } else {
                    inf.clone()
                }
            }
            (Real::PosInf | Real::NegInf, Real::PosInf | Real::NegInf) => Real::NaN,
        }
    }

    pub fn floor(&self) -> Self {
        match self {
            Real::Finite(b) => {
                let truncated = b.with_scale(0);
                let adjust = adjust_if_negative_fraction(b, &truncated);
                Real::Finite(&truncated - &adjust)
            }
            other => other.clone(),
        }
    }

    pub fn ceil(&self) -> Self {
        self.neg().floor().neg()
    }

    pub fn fix(&self) -> Self {
        match self {
            Real::Finite(b) => Real::Finite(b.with_scale(0)),
            other => other.clone(),
        }
    }

    pub fn round(&self) -> Self {
        match self {
            Real::Finite(b) => Real::Finite(b.round(0)),
            other => other.clone(),
        }
    }

    /// Total order used for real-only comparisons (spec §4.2: "Real-only
    /// operands short-circuit to the usual real order").
    pub fn cmp_real(&self, other: &Real) -> Ordering {
        fn rank(r: &Real) -> i8 {
            match r {
                Real::NegInf => 0,
                Real::Finite(_) => 1,
                Real::PosInf => 2,
                Real::NaN => 3,
            }
        }
        match (self, other) {
            (Real::Finite(a), Real::Finite(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

/// `b.with_scale(0)` truncates toward zero; this computes the amount to
/// subtract so that the result floors toward negative infinity for negative
/// non-integers.
fn adjust_if_negative_fraction(b: &BigDecimal, truncated: &BigDecimal) -> BigDecimal {
    if truncated != b && b.sign() == Sign::Minus {
        BigDecimal::from(1)
    } else {
        BigDecimal::from(0)
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Real::Finite(b) => write!(f, "{b}"),
            Real::PosInf => write!(f, "Inf"),
            Real::NegInf => write!(f, "-Inf"),
            Real::NaN => write!(f, "NaN"),
        }
    }
}

/// An arbitrary-precision complex scalar (spec §3.1's Scalar variant, minus
/// the class tag which lives on `Value::Scalar`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Complex {
    pub re: Real,
    pub im: Real,
}

impl Complex {
    pub fn real(re: Real) -> Self {
        Self { re, im: Real::zero() }
    }

    pub fn from_i64(v: i64) -> Self {
        Self::real(Real::from_i64(v))
    }

    pub fn zero() -> Self {
        Self::real(Real::zero())
    }

    pub fn is_real(&self) -> bool {
        self.im.is_zero()
    }

    pub fn is_nan(&self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }

    pub fn to_bool(&self) -> bool {
        !(self.re.is_zero() && self.im.is_zero()) && !self.is_nan()
    }

    pub fn add(&self, o: &Complex, ctx: &NumericContext) -> Complex {
        Complex { re: self.re.add(&o.re, ctx), im: self.im.add(&o.im, ctx) }
    }

    pub fn sub(&self, o: &Complex, ctx: &NumericContext) -> Complex {
        Complex { re: self.re.sub(&o.re, ctx), im: self.im.sub(&o.im, ctx) }
    }

    pub fn neg(&self) -> Complex {
        Complex { re: self.re.neg(), im: self.im.neg() }
    }

    pub fn conj(&self) -> Complex {
        Complex { re: self.re.clone(), im: self.im.neg() }
    }

    pub fn mul(&self, o: &Complex, ctx: &NumericContext) -> Complex {
        // (a+bi)(c+di) = (ac-bd) + (ad+bc)i
        let ac = self.re.mul(&o.re, ctx);
        let bd = self.im.mul(&o.im, ctx);
        let ad = self.re.mul(&o.im, ctx);
        let bc = self.im.mul(&o.re, ctx);
        Complex { re: ac.sub(&bd, ctx), im: ad.add(&bc, ctx) }
    }

    /// `self / other` (right division, `./` / `/`).
    pub fn div_right(&self, o: &Complex, ctx: &NumericContext) -> Complex {
        if o.re.is_nan() || o.im.is_nan() || self.re.is_nan() || self.im.is_nan() {
            return Complex { re: Real::NaN, im: Real::NaN };
        }
        if o.re.is_infinite() || o.im.is_infinite() {
            // Non-NaN finite divided by an infinite operand tends to 0,
            // unless the numerator is itself infinite, which is ambiguous
            // and reported as NaN (spec §4.2).
            return if self.re.is_infinite() || self.im.is_infinite() {
                Complex { re: Real::NaN, im: Real::NaN }
            } else {
                Complex::zero()
            };
        }
        let denom = o.re.mul(&o.re, ctx).add(&o.im.mul(&o.im, ctx), ctx);
        if denom.is_zero() {
            if self.re.is_zero() && self.im.is_zero() {
                return Complex { re: Real::NaN, im: Real::NaN };
            }
            let sign_re = if self.re.is_negative() { Real::NegInf } else { Real::PosInf };
            let sign_im = if self.im.is_negative() { Real::NegInf } else { Real::PosInf };
            return Complex { re: sign_re, im: sign_im };
        }
        let num_re = self.re.mul(&o.re, ctx).add(&self.im.mul(&o.im, ctx), ctx);
        let num_im = self.im.mul(&o.re, ctx).sub(&self.re.mul(&o.im, ctx), ctx);
        Complex { re: num_re.div(&denom, ctx), im: num_im.div(&denom, ctx) }
    }

    /// `other / self` (left division, `.\` / `\`).
    pub fn div_left(&self, o: &Complex, ctx: &NumericContext) -> Complex {
        o.div_right(self, ctx)
    }

    pub fn abs(&self, ctx: &NumericContext) -> Real {
        if self.is_nan() {
            return Real::NaN;
        }
        if self.re.is_infinite() || self.im.is_infinite() {
            return Real::PosInf;
        }
        if self.is_real() {
            return self.re.abs();
        }
        let h = self.re.to_f64().hypot(self.im.to_f64());
        Real::from_f64(h, ctx)
    }

    /// Principal argument in `(-pi, pi]`.
    pub fn arg(&self, ctx: &NumericContext) -> Real {
        if self.is_nan() {
            return Real::NaN;
        }
        Real::from_f64(self.im.to_f64().atan2(self.re.to_f64()), ctx)
    }

    pub fn sign(&self, ctx: &NumericContext) -> Complex {
        if self.re.is_zero() && self.im.is_zero() {
            return Complex::zero();
        }
        let m = self.abs(ctx);
        self.div_right(&Complex::real(m), ctx)
    }

    /// Polar lexicographic comparison: absolute value first, argument
    /// second (spec §4.2).
    pub fn cmp_polar(&self, other: &Complex, ctx: &NumericContext) -> Ordering {
        if self.is_real() && other.is_real() {
            return self.re.cmp_real(&other.re);
        }
        match self.abs(ctx).cmp_real(&other.abs(ctx)) {
            Ordering::Equal => self.arg(ctx).cmp_real(&other.arg(ctx)),
            other_order => other_order,
        }
    }

    /// Equality at display precision (spec §4.2).
    pub fn eq_display(&self, other: &Complex, ctx: &NumericContext) -> bool {
        round_display_real(&self.re, ctx) == round_display_real(&other.re, ctx)
            && round_display_real(&self.im, ctx) == round_display_real(&other.im, ctx)
    }

    fn elementwise_real<F: Fn(&Real) -> Real>(&self, f: F) -> Complex {
        Complex { re: f(&self.re), im: f(&self.im) }
    }

    pub fn floor(&self) -> Complex {
        self.elementwise_real(Real::floor)
    }
    pub fn ceil(&self) -> Complex {
        self.elementwise_real(Real::ceil)
    }
    pub fn round(&self) -> Complex {
        self.elementwise_real(Real::round)
    }
    pub fn fix(&self) -> Complex {
        self.elementwise_real(Real::fix)
    }

    pub fn pow(&self, exp: &Complex, ctx: &NumericContext) -> Complex {
        if self.is_nan() || exp.is_nan() {
            return Complex { re: Real::NaN, im: Real::NaN };
        }
        if self.is_real() && exp.is_real() && !self.re.is_negative() {
            let r = self.re.to_f64().powf(exp.re.to_f64());
            return Complex::real(Real::from_f64(r, ctx));
        }
        // Principal branch: exp(y * log(x)).
        let ln_self = self.ln(ctx);
        let product = exp.mul(&ln_self, ctx);
        product.exp(ctx)
    }

    pub fn sqrt(&self, ctx: &NumericContext) -> Complex {
        self.pow(&Complex::real(Real::Finite(BigDecimal::try_from(0.5).unwrap())), ctx)
    }

    pub fn exp(&self, ctx: &NumericContext) -> Complex {
        let r = self.re.to_f64().exp();
        let re = r * self.im.to_f64().cos();
        let im = r * self.im.to_f64().sin();
        Complex { re: Real::from_f64(re, ctx), im: Real::from_f64(im, ctx) }
    }

    pub fn ln(&self, ctx: &NumericContext) -> Complex {
        let m = self.abs(ctx).to_f64();
        let theta = self.arg(ctx).to_f64();
        Complex { re: Real::from_f64(m.ln(), ctx), im: Real::from_f64(theta, ctx) }
    }

    pub fn log10(&self, ctx: &NumericContext) -> Complex {
        let ln10 = Real::from_f64(10f64.ln(), ctx);
        let l = self.ln(ctx);
        Complex { re: l.re.div(&ln10, ctx), im: l.im.div(&ln10, ctx) }
    }

    pub fn log_base(&self, base: &Complex, ctx: &NumericContext) -> Complex {
        self.ln(ctx).div_right(&base.ln(ctx), ctx)
    }

    /// `i` multiplied by `self` (used by the log-based inverse trig
    /// identities below).
    fn times_i(&self) -> Complex {
        Complex { re: self.im.neg(), im: self.re.clone() }
    }

    pub fn sin(&self, ctx: &NumericContext) -> Complex {
        let (x, y) = (self.re.to_f64(), self.im.to_f64());
        Complex {
            re: Real::from_f64(x.sin() * y.cosh(), ctx),
            im: Real::from_f64(x.cos() * y.sinh(), ctx),
        }
    }

    pub fn cos(&self, ctx: &NumericContext) -> Complex {
        let (x, y) = (self.re.to_f64(), self.im.to_f64());
        Complex {
            re: Real::from_f64(x.cos() * y.cosh(), ctx),
            im: Real::from_f64(-(x.sin()) * y.sinh(), ctx),
        }
    }

    pub fn tan(&self, ctx: &NumericContext) -> Complex {
        self.sin(ctx).div_right(&self.cos(ctx), ctx)
    }

    pub fn sinh(&self, ctx: &NumericContext) -> Complex {
        let (x, y) = (self.re.to_f64(), self.im.to_f64());
        Complex {
            re: Real::from_f64(x.sinh() * y.cos(), ctx),
            im: Real::from_f64(x.cosh() * y.sin(), ctx),
        }
    }

    pub fn cosh(&self, ctx: &NumericContext) -> Complex {
        let (x, y) = (self.re.to_f64(), self.im.to_f64());
        Complex {
            re: Real::from_f64(x.cosh() * y.cos(), ctx),
            im: Real::from_f64(x.sinh() * y.sin(), ctx),
        }
    }

    pub fn tanh(&self, ctx: &NumericContext) -> Complex {
        self.sinh(ctx).div_right(&self.cosh(ctx), ctx)
    }

    /// `asin(z) = -i * ln(iz + sqrt(1 - z^2))`.
    pub fn asin(&self, ctx: &NumericContext) -> Complex {
        let one = Complex::from_i64(1);
        let z2 = self.mul(self, ctx);
        let inner = one.sub(&z2, ctx).sqrt(ctx).add(&self.times_i(), ctx);
        inner.ln(ctx).times_i().neg()
    }

    /// `acos(z) = -i * ln(z + i*sqrt(1 - z^2))`.
    pub fn acos(&self, ctx: &NumericContext) -> Complex {
        let one = Complex::from_i64(1);
        let z2 = self.mul(self, ctx);
        let root = one.sub(&z2, ctx).sqrt(ctx);
        let inner = self.add(&root.times_i(), ctx);
        inner.ln(ctx).times_i().neg()
    }

    /// `atan(z) = (i/2) * ln((1-iz)/(1+iz))`.
    pub fn atan(&self, ctx: &NumericContext) -> Complex {
        let one = Complex::from_i64(1);
        let iz = self.times_i();
        let ratio = one.sub(&iz, ctx).div_right(&one.add(&iz, ctx), ctx);
        let half_i = Complex { re: Real::zero(), im: Real::Finite(bigdecimal::BigDecimal::try_from(0.5).unwrap()) };
        ratio.ln(ctx).mul(&half_i, ctx)
    }

    /// `asinh(z) = ln(z + sqrt(z^2 + 1))`.
    pub fn asinh(&self, ctx: &NumericContext) -> Complex {
        let one = Complex::from_i64(1);
        let z2 = self.mul(self, ctx);
        z2.add(&one, ctx).sqrt(ctx).add(self, ctx).ln(ctx)
    }

    /// `acosh(z) = ln(z + sqrt(z^2 - 1))`.
    pub fn acosh(&self, ctx: &NumericContext) -> Complex {
        let one = Complex::from_i64(1);
        let z2 = self.mul(self, ctx);
        z2.sub(&one, ctx).sqrt(ctx).add(self, ctx).ln(ctx)
    }

    /// `atanh(z) = 0.5 * ln((1+z)/(1-z))`.
    pub fn atanh(&self, ctx: &NumericContext) -> Complex {
        let one = Complex::from_i64(1);
        let ratio = one.add(self, ctx).div_right(&one.sub(self, ctx), ctx);
        let half = Complex::real(Real::Finite(bigdecimal::BigDecimal::try_from(0.5).unwrap()));
        ratio.ln(ctx).mul(&half, ctx)
    }

    /// Lanczos-approximation gamma function (real & complex arguments).
    pub fn gamma(&self, ctx: &NumericContext) -> Complex {
        let re = self.re.to_f64();
        let im = self.im.to_f64();
        let (gr, gi) = lanczos_gamma(re, im);
        Complex { re: Real::from_f64(gr, ctx), im: Real::from_f64(gi, ctx) }
    }

    /// `factorial(n) = gamma(n+1)`, restricted to non-negative integers
    /// (spec §4.2; raises `Arithmetic` otherwise via the caller).
    pub fn factorial(&self, ctx: &NumericContext) -> Option<Complex> {
        if !self.is_real() {
            return None;
        }
        let n = self.re.to_f64();
        if n < 0.0 || n.fract() != 0.0 {
            return None;
        }
        let plus_one = Complex::real(Real::from_f64(n + 1.0, ctx));
        Some(plus_one.gamma(ctx))
    }
}

fn round_display_real(r: &Real, ctx: &NumericContext) -> String {
    match r {
        Real::Finite(b) => ctx.round_display(b).to_string(),
        other => other.to_string(),
    }
}

/// Lanczos approximation, g=7, n=9 coefficients (standard reference table).
fn lanczos_gamma(re: f64, im: f64) -> (f64, f64) {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.323428777653_13,
        -176.615029162140_59,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    // Reflection formula for Re(z) < 0.5: gamma(z) = pi / (sin(pi z) * gamma(1-z)).
    if re < 0.5 {
        let (sr, si) = sin_complex(std::f64::consts::PI * re, std::f64::consts::PI * im);
        let (gr, gi) = lanczos_gamma(1.0 - re, -im);
        let (denom_r, denom_i) = complex_mul(sr, si, gr, gi);
        return complex_div(std::f64::consts::PI, 0.0, denom_r, denom_i);
    }
    let xr = re - 1.0;
    let xi = im;
    let mut ar = COEFFS[0];
    let mut ai = 0.0;
    for (i, c) in COEFFS.iter().enumerate().skip(1) {
        let denom_re = xr + i as f64;
        let denom_im = xi;
        let d = denom_re * denom_re + denom_im * denom_im;
        ar += c * denom_re / d;
        ai += -c * denom_im / d;
    }
    let tr = xr + G + 0.5;
    let ti = xi;
    let sqrt_2pi = (2.0 * std::f64::consts::PI).sqrt();
    // result = sqrt(2pi) * t^(x+0.5) * exp(-t) * a
    let (tpow_r, tpow_i) = complex_pow(tr, ti, xr + 0.5, xi);
    let (exp_r, exp_i) = complex_exp(-tr, -ti);
    let (mul1_r, mul1_i) = complex_mul(tpow_r, tpow_i, exp_r, exp_i);
    let (mul2_r, mul2_i) = complex_mul(mul1_r, mul1_i, ar, ai);
    (sqrt_2pi * mul2_r, sqrt_2pi * mul2_i)
}

fn complex_mul(ar: f64, ai: f64, br: f64, bi: f64) -> (f64, f64) {
    (ar * br - ai * bi, ar * bi + ai * br)
}

fn complex_div(ar: f64, ai: f64, br: f64, bi: f64) -> (f64, f64) {
    let d = br * br + bi * bi;
    ((ar * br + ai * bi) / d, (ai * br - ar * bi) / d)
}

fn complex_exp(re: f64, im: f64) -> (f64, f64) {
    let r = re.exp();
    (r * im.cos(), r * im.sin())
}

fn complex_ln(re: f64, im: f64) -> (f64, f64) {
    (re.hypot(im).ln(), im.atan2(re))
}

fn complex_pow(br: f64, bi: f64, er: f64, ei: f64) -> (f64, f64) {
    let (lr, li) = complex_ln(br, bi);
    let (mr, mi) = complex_mul(er, ei, lr, li);
    complex_exp(mr, mi)
}

fn sin_complex(re: f64, im: f64) -> (f64, f64) {
    (re.sin() * im.cosh(), re.cos() * im.sinh())
}
