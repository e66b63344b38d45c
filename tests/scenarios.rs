//! The universal properties and concrete scenario table from spec §8, one
//! test per row/property.

use mlab_eval::{Evaluator, EvaluatorConfig, ExitStatus, Value};

fn run(src: &str) -> mlab_eval::EvalOutcome {
    let mut ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse(src).expect("parse should succeed");
    ev.evaluate(&ast)
}

fn last_scalar(outcome: &mlab_eval::EvalOutcome) -> f64 {
    match outcome.results.last().and_then(|r| r.value.clone()) {
        Some(Value::Scalar(c, _)) => c.re.to_f64(),
        other => panic!("expected a scalar result, got {other:?}"),
    }
}

fn last_row(outcome: &mlab_eval::EvalOutcome) -> Vec<f64> {
    match outcome.results.last().and_then(|r| r.value.clone()) {
        Some(Value::MultiArray(a)) => a
            .data
            .iter()
            .map(|v| match v {
                Value::Scalar(c, _) => c.re.to_f64(),
                other => panic!("expected scalar elements, got {other:?}"),
            })
            .collect(),
        other => panic!("expected a MultiArray result, got {other:?}"),
    }
}

// ---- concrete scenario table ----------------------------------------

#[test]
fn scenario_operator_precedence() {
    let out = run("a = 2 + 3*4; a");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 14.0);
}

#[test]
fn scenario_subscripted_row_selection() {
    let out = run("A = [1,2;3,4]; A(2, :)");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_row(&out), vec![3.0, 4.0]);
}

#[test]
fn scenario_logical_indexing_filters_above_a_threshold() {
    let out = run("x = [10,20,30,40]; x(x>15)");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_row(&out), vec![20.0, 30.0, 40.0]);
}

#[test]
fn scenario_function_definition_rule_five_surface_form() {
    let out = run("g(n) = n*2;\ng(7)");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 14.0);
}

#[test]
fn scenario_nested_structure_field_assignment() {
    let out = run("s.a.b = 5;\ns.a.b");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 5.0);
}

#[test]
fn scenario_if_elseif_else_chain() {
    let out = run("if 0; 1; elseif 1; 2; else 3; endif");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 2.0);
}

// ---- universal properties -------------------------------------------

#[test]
fn property_assignment_idempotence() {
    let direct = run("3 + 4 * 2");
    let via_assign = run("x = 3 + 4 * 2;\nx");
    assert_eq!(last_scalar(&direct), last_scalar(&via_assign));
}

#[test]
fn property_logical_indexing_matches_find() {
    let by_mask = run("A = [5, 0, 9, 0, 2];\nA(A ~= 0)");
    let by_find = run("A = [5, 0, 9, 0, 2];\nA(find(A ~= 0))");
    assert_eq!(last_row(&by_mask), last_row(&by_find));
}

#[test]
fn property_factorial_matches_the_running_product() {
    for n in 0..=6 {
        let fact = run(&format!("factorial({n})"));
        let prod = run(&format!("prod(1:{n})"));
        assert!(
            (last_scalar(&fact) - last_scalar(&prod)).abs() < 1e-6,
            "factorial({n}) should equal prod(1:{n})"
        );
    }
}

#[test]
fn property_addition_and_multiplication_are_commutative_and_associative() {
    let out_a = run("a = 7; b = 13; a + b");
    let out_b = run("a = 7; b = 13; b + a");
    assert_eq!(last_scalar(&out_a), last_scalar(&out_b));

    let assoc_left = run("(2 * 3) * 5");
    let assoc_right = run("2 * (3 * 5)");
    assert_eq!(last_scalar(&assoc_left), last_scalar(&assoc_right));
}

#[test]
fn property_range_length_matches_the_closed_form() {
    let out = run("length(1:2:10)");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    // max(0, floor((10-1)/2) + 1) = 5
    assert_eq!(last_scalar(&out), 5.0);
}

// ---- edge cases --------------------------------------------------------

#[test]
fn edge_case_clear_with_no_arguments_resets_ans_too() {
    let out = run("9 * 9;\nclear\nans");
    assert_eq!(out.exit_status, ExitStatus::EvalError);
}

#[test]
fn edge_case_redefining_a_constant_then_clearing_restores_it() {
    let out = run("pi = 3;\nclear pi\npi");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert!((last_scalar(&out) - std::f64::consts::PI).abs() < 1e-9);
}
