//! Minimal hand-written front end: lexer + recursive-descent parser
//! producing the AST shape in `crate::ast` (expanded-spec section B).

mod lexer;
mod parser;

use crate::ast::Ast;
use crate::error::EvalResult;

pub fn parse(source: &str) -> EvalResult<Ast> {
    let tokens = lexer::lex(source)?;
    parser::Parser::new(tokens).parse_program()
}
