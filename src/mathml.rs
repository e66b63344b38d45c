//! Presentation MathML unparser (spec §4.6): renders an `Ast` or a bare
//! `Value` as a self-contained `<math>` fragment. Total function like
//! `unparse` — any node this can't render falls back to `<mi>error</mi>`
//! unless the debug flag asks for a visible `<merror>` instead.

use crate::array::MultiArray;
use crate::ast::{Ast, BinOp, Delimiter, FieldName, Node, NodeId, UnOp};
use crate::env::Environment;
use crate::structure::Structure;
use crate::unparse::Unparsable;
use crate::value::{Value, format_complex};

pub fn unparse_program<'a>(input: impl Into<Unparsable<'a>>, display_block: bool, debug: bool, env: &Environment) -> String {
    let display = if display_block { "block" } else { "inline" };
    let body = match input.into() {
        Unparsable::Ast(ast) => ast
            .statements
            .iter()
            .map(|stmt| mathml_node(ast, stmt.root, debug, env))
            .collect::<Vec<_>>()
            .join("<mspace linebreak=\"newline\"/>"),
        Unparsable::Value(v) => mathml_value(v),
    };
    format!(r#"<math xmlns="http://www.w3.org/1998/Math/MathML" display="{display}">{body}</math>"#)
}

/// Renders a bare value's self-contained MathML body (spec §4.4: an
/// `mtable` of rows for both arrays and structures).
fn mathml_value(v: &Value) -> String {
    match v {
        Value::Scalar(c, _) => format!("<mn>{}</mn>", format_complex(c)),
        Value::CharString(s) => format!("<mtext>{}</mtext>", escape(&s.as_string())),
        Value::MultiArray(a) => mathml_value_matrix(a),
        Value::Structure(s) => mathml_value_struct(s),
    }
}

fn mathml_value_matrix(a: &MultiArray) -> String {
    let (rows, cols) = if a.dims.len() == 2 { (a.dims[0], a.dims[1]) } else { (1, a.data.len()) };
    let body: String = (0..rows)
        .map(|r| {
            let cells: String = (0..cols).map(|c| format!("<mtd>{}</mtd>", mathml_value(&a.data[r * cols + c]))).collect();
            format!("<mtr>{cells}</mtr>")
        })
        .collect();
    format!("<mrow><mo>[</mo><mtable>{body}</mtable><mo>]</mo></mrow>")
}

fn mathml_value_struct(s: &Structure) -> String {
    let body: String = s
        .iter()
        .map(|(k, v)| format!("<mtr><mtd><mi>{}</mi></mtd><mtd>{}</mtd></mtr>", escape(k), mathml_value(v)))
        .collect();
    format!("<mtable>{body}</mtable>")
}

fn error_fallback(debug: bool, detail: &str) -> String {
    if debug {
        format!("<merror><mtext>{detail}</mtext></merror>")
    } else {
        "<mi>error</mi>".to_string()
    }
}

fn bin_op_mathml(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul | BinOp::MulElem => "&#x2062;",
        BinOp::Div | BinOp::DivElem => "/",
        BinOp::LeftDiv | BinOp::LeftDivElem => "\\",
        BinOp::Pow | BinOp::PowElem => "^",
        BinOp::Lt => "&lt;",
        BinOp::Le => "&#x2264;",
        BinOp::Gt => "&gt;",
        BinOp::Ge => "&#x2265;",
        BinOp::Eq => "=",
        BinOp::Ne => "&#x2260;",
        BinOp::And | BinOp::AndShort => "&#x2227;",
        BinOp::Or | BinOp::OrShort => "&#x2228;",
    }
}

/// Renders `name` as an identifier, special-casing the two infinities and
/// NaN the way the spec's numeric display rules name them (spec §4.6).
fn ident_mathml(name: &str) -> String {
    match name {
        "Inf" | "inf" => "<mi>&#x221E;</mi>".to_string(),
        "NaN" | "nan" => "<mi>NaN</mi>".to_string(),
        "pi" => "<mi>&#x3C0;</mi>".to_string(),
        other => format!("<mi>{}</mi>", escape(other)),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn mathml_node(ast: &Ast, id: NodeId, debug: bool, env: &Environment) -> String {
    match ast.get(id) {
        Node::Number(n) => format!("<mn>{}</mn>", format_number(*n)),
        Node::Str(s, _) => format!("<mtext>{}</mtext>", escape(s)),
        Node::Ident(name) => ident_mathml(name),
        Node::EndSentinel => "<mi>end</mi>".to_string(),
        Node::ColonSentinel => "<mo>:</mo>".to_string(),
        Node::WildcardSentinel => "<mi>~</mi>".to_string(),
        Node::Paren(inner) => format!("<mrow><mo>(</mo>{}<mo>)</mo></mrow>", mathml_node(ast, *inner, debug, env)),
        Node::Unary(UnOp::Neg, a) => format!("<mrow><mo>-</mo>{}</mrow>", mathml_node(ast, *a, debug, env)),
        Node::Unary(UnOp::Plus, a) => format!("<mrow><mo>+</mo>{}</mrow>", mathml_node(ast, *a, debug, env)),
        Node::Unary(UnOp::Not, a) => format!("<mrow><mo>&#xAC;</mo>{}</mrow>", mathml_node(ast, *a, debug, env)),
        Node::Unary(UnOp::Transpose, a) => format!("<msup>{}<mo>T</mo></msup>", mathml_node(ast, *a, debug, env)),
        Node::Unary(UnOp::CTranspose, a) => format!("<msup>{}<mo>*</mo></msup>", mathml_node(ast, *a, debug, env)),
        Node::Binary(op, l, r) => {
            let (lm, rm) = (mathml_node(ast, *l, debug, env), mathml_node(ast, *r, debug, env));
            match op {
                BinOp::Div | BinOp::DivElem => format!("<mfrac>{lm}{rm}</mfrac>"),
                BinOp::Pow | BinOp::PowElem => format!("<msup>{lm}{rm}</msup>"),
                _ => format!("<mrow>{lm}<mo>{}</mo>{rm}</mrow>", bin_op_mathml(*op)),
            }
        }
        Node::Range { start, stride: None, stop } => {
            format!("<mrow>{}<mo>:</mo>{}</mrow>", mathml_node(ast, *start, debug, env), mathml_node(ast, *stop, debug, env))
        }
        Node::Range { start, stride: Some(s), stop } => format!(
            "<mrow>{}<mo>:</mo>{}<mo>:</mo>{}</mrow>",
            mathml_node(ast, *start, debug, env),
            mathml_node(ast, *s, debug, env),
            mathml_node(ast, *stop, debug, env)
        ),
        Node::MatrixLiteral { rows, delim } => mathml_matrix(ast, rows, *delim, debug, env),
        Node::Idx { target, args, delim } => mathml_idx(ast, *target, args, *delim, debug, env),
        Node::Field { target, name } => {
            let field = match name {
                FieldName::Static(n) => ident_mathml(n),
                FieldName::Dynamic(expr) => mathml_node(ast, *expr, debug, env),
            };
            format!("<mrow>{}<mo>.</mo>{field}</mrow>", mathml_node(ast, *target, debug, env))
        }
        Node::List { elements } => {
            let inner: String = elements.iter().map(|e| mathml_node(ast, *e, debug, env)).collect::<Vec<_>>().join("<mo>,</mo>");
            format!("<mrow><mo>[</mo>{inner}<mo>]</mo></mrow>")
        }
        Node::Assign { lhs, rhs } => {
            format!("<mrow>{}<mo>=</mo>{}</mrow>", mathml_node(ast, *lhs, debug, env), mathml_node(ast, *rhs, debug, env))
        }
        Node::If { .. } => error_fallback(debug, "control-flow statements have no MathML rendering"),
        Node::CmdWList { .. } => error_fallback(debug, "command statements have no MathML rendering"),
        Node::RetListSelect { call, .. } => mathml_node(ast, *call, debug, env),
    }
}

/// Calls through a registered decorative override (spec §4.6: absolute
/// value bars, square root, subscript-base logarithm, capital gamma,
/// trailing-`!` factorial) before falling back to the generic
/// `name(arg, ...)` call shape.
fn mathml_idx(ast: &Ast, target: NodeId, args: &[NodeId], delim: Delimiter, debug: bool, env: &Environment) -> String {
    if let Node::Ident(name) = ast.get(target) {
        let resolved = env.resolve_alias(name);
        if let Some(render) = env.functions.get(resolved.as_str()).and_then(|f| f.mathml_override) {
            let rendered: Vec<String> = args.iter().map(|&a| mathml_node(ast, a, debug, env)).collect();
            return render(&rendered);
        }
    }
    let args_text: String = args.iter().map(|a| mathml_node(ast, *a, debug, env)).collect::<Vec<_>>().join("<mo>,</mo>");
    let (open, close) = match delim {
        Delimiter::Bracket => ("(", ")"),
        Delimiter::Brace => ("{", "}"),
    };
    format!(
        "<mrow>{}<mo>{open}</mo>{args_text}<mo>{close}</mo></mrow>",
        mathml_node(ast, target, debug, env)
    )
}

fn mathml_matrix(ast: &Ast, rows: &[Vec<NodeId>], delim: Delimiter, debug: bool, env: &Environment) -> String {
    let (open, close) = match delim {
        Delimiter::Bracket => ("[", "]"),
        Delimiter::Brace => ("{", "}"),
    };
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row.iter().map(|e| format!("<mtd>{}</mtd>", mathml_node(ast, *e, debug, env))).collect();
            format!("<mtr>{cells}</mtr>")
        })
        .collect();
    format!("<mrow><mo>{open}</mo><mtable>{body}</mtable><mo>{close}</mo></mrow>")
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}
