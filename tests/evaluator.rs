//! Integration tests driving the public `parse`/`evaluate` surface end to
//! end, covering the concrete scenarios and universal properties this
//! language is expected to satisfy.

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

#[test]
fn arithmetic_updates_ans() {
    let out = run("1 + 2\nans * 10");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 30.0);
}

#[test]
fn trailing_semicolon_suppresses_echo_but_still_sets_ans() {
    let out = run("5 + 5;\nans");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(out.results[0].echoed, false);
    assert_eq!(last_scalar(&out), 10.0);
}

#[test]
fn retlist_undersupply_reports_exact_message() {
    // `numel` only ever produces one output; asking for two must fail with
    // the spec-exact message rather than silently padding the list.
    let out = run("[a, b] = numel(5)");
    assert_eq!(out.exit_status, ExitStatus::EvalError);
    let msg = out.message.expect("error message");
    assert!(msg.contains("element number 2 undefined in return list"), "message was: {msg}");
}

#[test]
fn shadowing_a_constant_then_clearing_restores_it() {
    let out = run("pi = 3;\nclear pi\npi");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    // After `clear pi` the native constant is restored.
    assert!((last_scalar(&out) - std::f64::consts::PI).abs() < 1e-9);
}

#[test]
fn bare_clear_resets_ans() {
    let out = run("7 + 7;\nclear\nans");
    assert_eq!(out.exit_status, ExitStatus::EvalError);
    let msg = out.message.unwrap();
    assert!(msg.contains("is undefined"), "message was: {msg}");
}

#[test]
fn end_resolves_against_the_enclosing_index_dimension() {
    let out = run("a = [1, 2, 3, 4, 5];\na(end)");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 5.0);
}

#[test]
fn end_minus_one_inside_nested_indexing() {
    let out = run("a = [10, 20, 30, 40];\nb = [1, 2, 3];\na(b(end))");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    // b(end) == 3, a(3) == 30
    assert_eq!(last_scalar(&out), 30.0);
}

#[test]
fn bare_colon_flattens_in_column_major_order() {
    let out = run("a = [1, 2; 3, 4];\na(:)");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    match out.results.last().unwrap().value.clone().unwrap() {
        Value::MultiArray(arr) => {
            let vals: Vec<f64> = arr
                .data
                .iter()
                .map(|v| match v {
                    Value::Scalar(c, _) => c.re.to_f64(),
                    _ => panic!("expected scalar elements"),
                })
                .collect();
            assert_eq!(vals, vec![1.0, 3.0, 2.0, 4.0]);
        }
        other => panic!("expected a MultiArray, got {other:?}"),
    }
}

#[test]
fn multi_assignment_from_size() {
    let out = run("a = [1, 2, 3; 4, 5, 6];\n[r, c] = size(a);\nr * 10 + c");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 23.0);
}

#[test]
fn assignment_rule_five_defines_a_user_function() {
    let out = run("sq(x) = x * x;\nsq(5)");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 25.0);
}

#[test]
fn assignment_into_unbound_index_names_is_indexed_write_when_target_is_bound_array() {
    // `a(k) = 9` is an indexed write, not a function definition, because
    // `a` already names a variable rather than being freshly defined here.
    let out = run("a = [1, 2, 3];\nk = 2;\na(k) = 9;\na");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    match out.results.last().unwrap().value.clone().unwrap() {
        Value::MultiArray(arr) => {
            let vals: Vec<f64> = arr
                .data
                .iter()
                .map(|v| match v {
                    Value::Scalar(c, _) => c.re.to_f64(),
                    _ => panic!("expected scalar elements"),
                })
                .collect();
            assert_eq!(vals, vec![1.0, 9.0, 3.0]);
        }
        other => panic!("expected a MultiArray, got {other:?}"),
    }
}

#[test]
fn mapper_lifting_applies_sin_elementwise() {
    let out = run("sin([0, 0])");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    match out.results.last().unwrap().value.clone().unwrap() {
        Value::MultiArray(arr) => assert_eq!(arr.data.len(), 2),
        other => panic!("expected a MultiArray, got {other:?}"),
    }
}

#[test]
fn logical_indexing_selects_truthy_positions() {
    let out = run("a = [10, 20, 30, 40];\nmask = a > 15;\na(mask)");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    match out.results.last().unwrap().value.clone().unwrap() {
        Value::MultiArray(arr) => {
            let vals: Vec<f64> = arr
                .data
                .iter()
                .map(|v| match v {
                    Value::Scalar(c, _) => c.re.to_f64(),
                    _ => panic!("expected scalar elements"),
                })
                .collect();
            assert_eq!(vals, vec![20.0, 30.0, 40.0]);
        }
        other => panic!("expected a MultiArray, got {other:?}"),
    }
}

#[test]
fn if_elseif_else_picks_the_right_branch() {
    let out = run("x = 2;\nif x == 1\n  y = 10;\nelseif x == 2\n  y = 20;\nelse\n  y = 30;\nend\ny");
    assert_eq!(out.exit_status, ExitStatus::Ok);
    assert_eq!(last_scalar(&out), 20.0);
}

#[test]
fn undefined_reference_is_an_evaluation_error() {
    let out = run("totally_unknown_name");
    assert_eq!(out.exit_status, ExitStatus::EvalError);
    assert!(out.message.unwrap().contains("is undefined"));
}

#[test]
fn unparse_round_trips_a_simple_assignment() {
    let mut ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("x = 1 + 2").unwrap();
    let text = ev.unparse(&ast);
    assert_eq!(text, "x = 1 + 2");
}

#[test]
fn unparse_mathml_wraps_a_fraction() {
    let mut ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("a / b").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.starts_with("<math"));
    assert!(xml.contains("<mfrac>"));
}
