//! Exercises the text unparser (spec §4.5) across every statement shape it
//! is expected to round-trip in canonical form.

use mlab_eval::{Evaluator, EvaluatorConfig};

fn unparse(src: &str) -> String {
    let ev = Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse(src).expect("parse should succeed");
    ev.unparse(&ast)
}

#[test]
fn binary_expression_gets_spaced_operators() {
    assert_eq!(unparse("1+2*3"), "1 + 2 * 3");
}

#[test]
fn suppressed_statement_keeps_its_trailing_semicolon() {
    assert_eq!(unparse("x = 1;"), "x = 1;");
}

#[test]
fn matrix_literal_uses_comma_and_semicolon_separators() {
    assert_eq!(unparse("[1 2;3 4]"), "[1, 2; 3, 4]");
}

#[test]
fn indexed_call_renders_with_parens() {
    assert_eq!(unparse("a(1,2)"), "a(1, 2)");
}

#[test]
fn cell_index_renders_with_braces() {
    assert_eq!(unparse("c{1}"), "c{1}");
}

#[test]
fn range_with_stride_keeps_all_three_parts() {
    assert_eq!(unparse("1:2:10"), "1:2:10");
}

#[test]
fn field_access_renders_with_a_dot() {
    assert_eq!(unparse("s.field"), "s.field");
}

#[test]
fn ctranspose_renders_as_a_trailing_quote() {
    assert_eq!(unparse("a'"), "a'");
}

#[test]
fn multi_assignment_list_renders_as_brackets() {
    assert_eq!(unparse("[a, b] = size(x)"), "[a, b] = size(x)");
}

#[test]
fn if_else_renders_with_two_space_indented_bodies() {
    let out = unparse("if x\n  y = 1;\nelse\n  y = 2;\nend");
    assert_eq!(out, "IF x\n  y = 1;\nELSE\n  y = 2;\nENDIF");
}

#[test]
fn endif_and_endfunction_are_recognized_as_end_keywords() {
    assert_eq!(unparse("if 1; 2; endif"), "IF 1\n  2;\nENDIF");
}

#[test]
fn scalar_value_unparses_through_format_complex() {
    let ev = mlab_eval::Evaluator::new(EvaluatorConfig::builder().build());
    let v = mlab_eval::Value::from_i64(5);
    assert_eq!(ev.unparse(&v), "5");
}

#[test]
fn struct_value_unparses_as_struct_call_form() {
    let mut ev = mlab_eval::Evaluator::new(EvaluatorConfig::builder().build());
    let ast = ev.parse("s.a = 1; s.b = 2; s").expect("parse should succeed");
    let out = ev.evaluate(&ast);
    let v = out.results.last().and_then(|r| r.value.clone()).expect("s should evaluate to a value");
    assert_eq!(ev.unparse(&v), "struct(a = 1; b = 2)");
}
