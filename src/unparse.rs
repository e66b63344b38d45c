//! Canonical text unparser (spec §4.5): renders an `Ast` or a bare `Value`
//! back to source text. Total function — a node shape it doesn't recognize
//! renders as `<INVALID>` rather than panicking.

use crate::array::MultiArray;
use crate::ast::{Ast, BinOp, Delimiter, FieldName, Node, NodeId, UnOp};
use crate::structure::Structure;
use crate::value::{QuoteStyle, Value, format_complex};

/// Either half of the `unparse(ast | value)` entry point (spec §4.1).
pub enum Unparsable<'a> {
    Ast(&'a Ast),
    Value(&'a Value),
}

impl<'a> From<&'a Ast> for Unparsable<'a> {
    fn from(ast: &'a Ast) -> Self {
        Unparsable::Ast(ast)
    }
}

impl<'a> From<&'a Value> for Unparsable<'a> {
    fn from(v: &'a Value) -> Self {
        Unparsable::Value(v)
    }
}

pub fn unparse_program<'a>(input: impl Into<Unparsable<'a>>) -> String {
    match input.into() {
        Unparsable::Ast(ast) => ast
            .statements
            .iter()
            .map(|stmt| {
                let text = unparse_node(ast, stmt.root);
                if stmt.suppressed { format!("{text};") } else { text }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Unparsable::Value(v) => unparse_value(v),
    }
}

/// Renders a bare value the way it would read back in as a literal (spec
/// §4.5 "canonical surface form ... for every value variant").
pub fn unparse_value(v: &Value) -> String {
    match v {
        Value::Scalar(c, _) => format_complex(c),
        Value::CharString(s) => match s.quote {
            QuoteStyle::Single => format!("'{}'", s.as_string().replace('\'', "''")),
            QuoteStyle::Double => format!("\"{}\"", s.as_string()),
        },
        Value::MultiArray(a) => unparse_array(a),
        Value::Structure(s) => unparse_struct(s),
    }
}

fn unparse_array(a: &MultiArray) -> String {
    if a.dims.len() == 2 {
        let (rows, cols) = (a.dims[0], a.dims[1]);
        let body = (0..rows)
            .map(|r| (0..cols).map(|c| unparse_value(&a.data[r * cols + c])).collect::<Vec<_>>().join(", "))
            .collect::<Vec<_>>()
            .join("; ");
        format!("[{body}]")
    } else {
        let body = a.data.iter().map(unparse_value).collect::<Vec<_>>().join(", ");
        format!("[{body}]")
    }
}

/// `struct(fieldname = value; ...)` (spec §4.4).
fn unparse_struct(s: &Structure) -> String {
    let body = s.iter().map(|(k, v)| format!("{k} = {}", unparse_value(v))).collect::<Vec<_>>().join("; ");
    format!("struct({body})")
}

fn bin_op_text(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::MulElem => ".*",
        BinOp::Div => "/",
        BinOp::DivElem => "./",
        BinOp::LeftDiv => "\\",
        BinOp::LeftDivElem => ".\\",
        BinOp::Pow => "^",
        BinOp::PowElem => ".^",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::Eq => "==",
        BinOp::Ne => "~=",
        BinOp::And => "&",
        BinOp::Or => "|",
        BinOp::AndShort => "&&",
        BinOp::OrShort => "||",
    }
}

pub fn unparse_node(ast: &Ast, id: NodeId) -> String {
    match ast.get(id) {
        Node::Number(n) => format_number(*n),
        Node::Str(s, crate::value::QuoteStyle::Single) => format!("'{}'", s.replace('\'', "''")),
        Node::Str(s, crate::value::QuoteStyle::Double) => format!("\"{s}\""),
        Node::Ident(name) => name.clone(),
        Node::EndSentinel => "end".to_string(),
        Node::ColonSentinel => ":".to_string(),
        Node::WildcardSentinel => "~".to_string(),
        Node::Paren(inner) => format!("({})", unparse_node(ast, *inner)),
        Node::Unary(UnOp::Neg, a) => format!("-{}", unparse_node(ast, *a)),
        Node::Unary(UnOp::Plus, a) => format!("+{}", unparse_node(ast, *a)),
        Node::Unary(UnOp::Not, a) => format!("~{}", unparse_node(ast, *a)),
        Node::Unary(UnOp::Transpose, a) => format!("{}.'", unparse_node(ast, *a)),
        Node::Unary(UnOp::CTranspose, a) => format!("{}'", unparse_node(ast, *a)),
        Node::Binary(op, l, r) => format!("{} {} {}", unparse_node(ast, *l), bin_op_text(*op), unparse_node(ast, *r)),
        Node::Range { start, stride: None, stop } => format!("{}:{}", unparse_node(ast, *start), unparse_node(ast, *stop)),
        Node::Range { start, stride: Some(s), stop } => {
            format!("{}:{}:{}", unparse_node(ast, *start), unparse_node(ast, *s), unparse_node(ast, *stop))
        }
        Node::MatrixLiteral { rows, delim } => unparse_matrix(ast, rows, *delim),
        Node::Idx { target, args, delim } => {
            let (open, close) = match delim {
                Delimiter::Bracket => ("(", ")"),
                Delimiter::Brace => ("{", "}"),
            };
            let args_text = args.iter().map(|a| unparse_node(ast, *a)).collect::<Vec<_>>().join(", ");
            format!("{}{open}{args_text}{close}", unparse_node(ast, *target))
        }
        Node::Field { target, name } => match name {
            FieldName::Static(n) => format!("{}.{}", unparse_node(ast, *target), n),
            FieldName::Dynamic(expr) => format!("{}.({})", unparse_node(ast, *target), unparse_node(ast, *expr)),
        },
        Node::List { elements } => {
            let inner = elements.iter().map(|e| unparse_node(ast, *e)).collect::<Vec<_>>().join(", ");
            format!("[{inner}]")
        }
        Node::Assign { lhs, rhs } => format!("{} = {}", unparse_node(ast, *lhs), unparse_node(ast, *rhs)),
        Node::If { branches, else_body } => unparse_if(ast, branches, else_body),
        Node::CmdWList { name, args } => {
            if args.is_empty() {
                name.clone()
            } else {
                format!("{} {}", name, args.join(" "))
            }
        }
        Node::RetListSelect { call, .. } => unparse_node(ast, *call),
    }
}

fn unparse_matrix(ast: &Ast, rows: &[Vec<NodeId>], delim: Delimiter) -> String {
    let (open, close) = match delim {
        Delimiter::Bracket => ("[", "]"),
        Delimiter::Brace => ("{", "}"),
    };
    let body = rows
        .iter()
        .map(|row| row.iter().map(|e| unparse_node(ast, *e)).collect::<Vec<_>>().join(", "))
        .collect::<Vec<_>>()
        .join("; ");
    format!("{open}{body}{close}")
}

fn unparse_if(ast: &Ast, branches: &[(NodeId, Vec<NodeId>)], else_body: &[NodeId]) -> String {
    let mut out = String::new();
    for (i, (cond, body)) in branches.iter().enumerate() {
        if i == 0 {
            out.push_str(&format!("IF {}\n", unparse_node(ast, *cond)));
        } else {
            out.push_str(&format!("ELSEIF {}\n", unparse_node(ast, *cond)));
        }
        out.push_str(&unparse_body(ast, body));
    }
    if !else_body.is_empty() {
        out.push_str("ELSE\n");
        out.push_str(&unparse_body(ast, else_body));
    }
    out.push_str("ENDIF");
    out
}

fn unparse_body(ast: &Ast, body: &[NodeId]) -> String {
    body.iter().map(|&n| format!("  {}\n", unparse_node(ast, n))).collect()
}

/// Renders a finite literal the way the number was written; large/small
/// magnitudes fall back to Rust's default float formatting (spec §4.5
/// only governs the structural shape of output, not float rendering
/// fine print for literals re-unparsed from source).
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}
