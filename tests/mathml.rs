//! Exercises the presentation MathML unparser (spec §4.6): structural
//! shape, decorative overrides, and the documented error-fallback behavior.

use mlab_eval::{Evaluator, EvaluatorConfig};

#[test]
fn wraps_output_in_a_math_element() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("1 + 2").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.starts_with("<math"));
    assert!(xml.ends_with("</math>"));
}

#[test]
fn division_renders_as_mfrac() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("a / b").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("<mfrac>"));
}

#[test]
fn power_renders_as_msup() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("a ^ 2").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("<msup>"));
}

#[test]
fn sqrt_uses_the_decorative_radical_form() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("sqrt(x)").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("<msqrt>"));
}

#[test]
fn abs_uses_pipe_bars_rather_than_the_generic_call_shape() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("abs(x)").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("<mo>|</mo>"));
}

#[test]
fn infinity_identifier_renders_as_the_unicode_symbol() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("Inf").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("&#x221E;"));
}

#[test]
fn control_flow_has_no_mathml_rendering_and_falls_back_quietly_by_default() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("if x\n  y = 1;\nend").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("<mi>error</mi>"));
}

#[test]
fn display_block_attribute_reflects_the_requested_mode() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("1").unwrap();
    assert!(ev.unparse_mathml(&ast, true).contains("display=\"block\""));
    assert!(ev.unparse_mathml(&ast, false).contains("display=\"inline\""));
}

#[test]
fn factorial_renders_with_a_trailing_exclamation_mark() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("factorial(n)").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("<mo>!</mo>"));
}

#[test]
fn gamma_renders_with_the_capital_gamma_symbol() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("gamma(n)").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("&#x393;"));
}

#[test]
fn log10_renders_with_a_subscript_base() {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("log10(x)").unwrap();
    let xml = ev.unparse_mathml(&ast, false);
    assert!(xml.contains("<msub>"));
}

#[test]
fn struct_value_renders_as_an_mtable_of_field_rows() {
    let mut ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("s.a = 1; s").unwrap();
    let out = ev.evaluate(&ast);
    let v = out.results.last().and_then(|r| r.value.clone()).expect("s should evaluate to a value");
    let xml = ev.unparse_mathml(&v, false);
    assert!(xml.contains("<mtable>"));
}
