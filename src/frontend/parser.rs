//! Recursive-descent parser producing the `crate::ast::Ast` shape.
//!
//! Operator precedence, low to high, follows the conventional MATLAB/
//! Octave table: short-circuit `||`, short-circuit `&&`, elementwise `|`,
//! elementwise `&`, relational, range `:`, additive, multiplicative,
//! unary, power, postfix (call/index/field/transpose).

use super::lexer::{Tok, Token};
use crate::ast::{Ast, BinOp, Delimiter, FieldName, Node, NodeId, Statement, UnOp};
use crate::error::{EvalError, EvalResult};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    ast: Ast,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, ast: Ast::default() }
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, kind: &Tok) -> EvalResult<Token> {
        if std::mem::discriminant(&self.cur().kind) == std::mem::discriminant(kind) {
            Ok(self.advance())
        } else {
            Err(EvalError::syntax(format!("expected {kind:?}, found {:?}", self.cur().kind)).with_loc(self.cur().loc))
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.cur().kind, Tok::Newline | Tok::Semicolon | Tok::Comma) {
            self.advance();
        }
    }

    pub fn parse_program(mut self) -> EvalResult<Ast> {
        self.skip_separators();
        while !matches!(self.cur().kind, Tok::Eof) {
            let stmt = self.parse_statement()?;
            self.ast.statements.push(stmt);
            self.skip_separators();
        }
        self.ast.link_parents();
        Ok(self.ast)
    }

    fn parse_statement(&mut self) -> EvalResult<Statement> {
        let loc = self.cur().loc;
        let root = self.parse_statement_node()?;
        let suppressed = self.consume_terminator();
        Ok(Statement { root, loc, suppressed })
    }

    fn consume_terminator(&mut self) -> bool {
        match self.cur().kind {
            Tok::Semicolon => {
                self.advance();
                true
            }
            Tok::Comma | Tok::Newline => {
                self.advance();
                false
            }
            _ => false,
        }
    }

    fn parse_statement_node(&mut self) -> EvalResult<NodeId> {
        if matches!(self.cur().kind, Tok::If) {
            return self.parse_if();
        }
        if let Some((name, args)) = self.try_parse_command() {
            return Ok(self.ast.push(Node::CmdWList { name, args }));
        }
        self.parse_assignment_or_expr()
    }

    /// A command-word statement is a bare identifier immediately followed
    /// by more bare words, with no `(` or `=` introducing an expression
    /// (spec's command-word table, §3.3): `clear x y`, `hold on`.
    fn try_parse_command(&mut self) -> Option<(String, Vec<String>)> {
        let Tok::Ident(name) = self.cur().kind.clone() else { return None };
        if !matches!(self.peek(1).kind, Tok::Ident(_) | Tok::Number(_)) {
            return None;
        }
        let start = self.pos;
        self.advance();
        let mut args = Vec::new();
        while matches!(self.cur().kind, Tok::Ident(_) | Tok::Number(_)) {
            args.push(self.cur().text.clone());
            self.advance();
        }
        if !matches!(self.cur().kind, Tok::Newline | Tok::Semicolon | Tok::Comma | Tok::Eof) {
            // Turned out to be an expression after all (e.g. `a b` never
            // legally continues, but guard against stray trailing tokens).
            self.pos = start;
            return None;
        }
        Some((name, args))
    }

    fn parse_if(&mut self) -> EvalResult<NodeId> {
        self.advance(); // `if`
        let mut branches = Vec::new();
        let cond = self.parse_or_short()?;
        self.skip_separators();
        let body = self.parse_block_until(&[Tok::ElseIf, Tok::Else, Tok::End])?;
        branches.push((cond, body));
        loop {
            match self.cur().kind {
                Tok::ElseIf => {
                    self.advance();
                    let cond = self.parse_or_short()?;
                    self.skip_separators();
                    let body = self.parse_block_until(&[Tok::ElseIf, Tok::Else, Tok::End])?;
                    branches.push((cond, body));
                }
                _ => break,
            }
        }
        let else_body = if matches!(self.cur().kind, Tok::Else) {
            self.advance();
            self.skip_separators();
            self.parse_block_until(&[Tok::End])?
        } else {
            Vec::new()
        };
        self.expect(&Tok::End)?;
        Ok(self.ast.push(Node::If { branches, else_body }))
    }

    fn parse_block_until(&mut self, terminators: &[Tok]) -> EvalResult<Vec<NodeId>> {
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if terminators.iter().any(|t| std::mem::discriminant(t) == std::mem::discriminant(&self.cur().kind)) {
                break;
            }
            let node = self.parse_statement_node()?;
            self.consume_terminator();
            body.push(node);
        }
        Ok(body)
    }

    fn parse_assignment_or_expr(&mut self) -> EvalResult<NodeId> {
        let lhs = self.parse_or_short()?;
        if matches!(self.cur().kind, Tok::Assign) {
            self.advance();
            let rhs = self.parse_or_short()?;
            let lhs = self.reinterpret_as_lvalue(lhs);
            return Ok(self.ast.push(Node::Assign { lhs, rhs }));
        }
        Ok(lhs)
    }

    /// A `[a, b]` literal parsed as an ordinary matrix is reinterpreted as
    /// a multi-assignment output list only once we see the following `=`
    /// (spec §4.1 rule 5 / the RETLIST assignment form).
    fn reinterpret_as_lvalue(&mut self, id: NodeId) -> NodeId {
        if let Node::MatrixLiteral { rows, delim: Delimiter::Bracket } = self.ast.get(id).clone() {
            if rows.len() <= 1 {
                let elements = rows.into_iter().next().unwrap_or_default();
                return self.ast.push(Node::List { elements });
            }
        }
        id
    }

    fn parse_or_short(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_and_short()?;
        while matches!(self.cur().kind, Tok::OrOr) {
            self.advance();
            let right = self.parse_and_short()?;
            left = self.ast.push(Node::Binary(BinOp::OrShort, left, right));
        }
        Ok(left)
    }

    fn parse_and_short(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_or_elem()?;
        while matches!(self.cur().kind, Tok::AndAnd) {
            self.advance();
            let right = self.parse_or_elem()?;
            left = self.ast.push(Node::Binary(BinOp::AndShort, left, right));
        }
        Ok(left)
    }

    fn parse_or_elem(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_and_elem()?;
        while matches!(self.cur().kind, Tok::Pipe) {
            self.advance();
            let right = self.parse_and_elem()?;
            left = self.ast.push(Node::Binary(BinOp::Or, left, right));
        }
        Ok(left)
    }

    fn parse_and_elem(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_relational()?;
        while matches!(self.cur().kind, Tok::Amp) {
            self.advance();
            let right = self.parse_relational()?;
            left = self.ast.push(Node::Binary(BinOp::And, left, right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_range()?;
        loop {
            let op = match self.cur().kind {
                Tok::Lt => BinOp::Lt,
                Tok::Le => BinOp::Le,
                Tok::Gt => BinOp::Gt,
                Tok::Ge => BinOp::Ge,
                Tok::EqEq => BinOp::Eq,
                Tok::Ne => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_range()?;
            left = self.ast.push(Node::Binary(op, left, right));
        }
        Ok(left)
    }

    fn parse_range(&mut self) -> EvalResult<NodeId> {
        let start = self.parse_additive()?;
        if matches!(self.cur().kind, Tok::Colon) {
            self.advance();
            let second = self.parse_additive()?;
            if matches!(self.cur().kind, Tok::Colon) {
                self.advance();
                let stop = self.parse_additive()?;
                return Ok(self.ast.push(Node::Range { start, stride: Some(second), stop }));
            }
            return Ok(self.ast.push(Node::Range { start, stride: None, stop: second }));
        }
        Ok(start)
    }

    fn parse_additive(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.cur().kind {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.ast.push(Node::Binary(op, left, right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.cur().kind {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::Backslash => BinOp::LeftDiv,
                Tok::DotStar => BinOp::MulElem,
                Tok::DotSlash => BinOp::DivElem,
                Tok::DotBackslash => BinOp::LeftDivElem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.ast.push(Node::Binary(op, left, right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> EvalResult<NodeId> {
        match self.cur().kind {
            Tok::Plus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.ast.push(Node::Unary(UnOp::Plus, operand)))
            }
            Tok::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.ast.push(Node::Unary(UnOp::Neg, operand)))
            }
            Tok::Tilde => {
                if matches!(self.peek(1).kind, Tok::Comma | Tok::RBracket) {
                    self.advance();
                    return Ok(self.ast.push(Node::WildcardSentinel));
                }
                self.advance();
                let operand = self.parse_unary()?;
                Ok(self.ast.push(Node::Unary(UnOp::Not, operand)))
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_postfix()?;
        loop {
            let op = match self.cur().kind {
                Tok::Caret => BinOp::Pow,
                Tok::DotCaret => BinOp::PowElem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.ast.push(Node::Binary(op, left, right));
        }
        Ok(left)
    }

    fn parse_postfix(&mut self) -> EvalResult<NodeId> {
        let mut left = self.parse_primary()?;
        loop {
            match self.cur().kind {
                Tok::LParen => {
                    self.advance();
                    let args = self.parse_arg_list(&Tok::RParen)?;
                    self.expect(&Tok::RParen)?;
                    left = self.ast.push(Node::Idx { target: left, args, delim: Delimiter::Bracket });
                }
                Tok::LBrace => {
                    self.advance();
                    let args = self.parse_arg_list(&Tok::RBrace)?;
                    self.expect(&Tok::RBrace)?;
                    left = self.ast.push(Node::Idx { target: left, args, delim: Delimiter::Brace });
                }
                Tok::Dot => {
                    self.advance();
                    let name = if matches!(self.cur().kind, Tok::LParen) {
                        self.advance();
                        let expr = self.parse_or_short()?;
                        self.expect(&Tok::RParen)?;
                        FieldName::Dynamic(expr)
                    } else {
                        let Tok::Ident(n) = self.cur().kind.clone() else {
                            return Err(EvalError::syntax("expected a field name after '.'").with_loc(self.cur().loc));
                        };
                        self.advance();
                        FieldName::Static(n)
                    };
                    left = self.ast.push(Node::Field { target: left, name });
                }
                Tok::Transpose => {
                    self.advance();
                    left = self.ast.push(Node::Unary(UnOp::CTranspose, left));
                }
                Tok::DotTranspose => {
                    self.advance();
                    left = self.ast.push(Node::Unary(UnOp::Transpose, left));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// Parses a call/index argument list. A bare `:` argument (not part
    /// of a range) is the whole-dimension sentinel (spec §4.1).
    fn parse_arg_list(&mut self, closing: &Tok) -> EvalResult<Vec<NodeId>> {
        let mut args = Vec::new();
        if std::mem::discriminant(&self.cur().kind) == std::mem::discriminant(closing) {
            return Ok(args);
        }
        loop {
            let next_ends_arg = matches!(self.peek(1).kind, Tok::Comma) || std::mem::discriminant(&self.peek(1).kind) == std::mem::discriminant(closing);
            if matches!(self.cur().kind, Tok::Colon) && next_ends_arg {
                self.advance();
                args.push(self.ast.push(Node::ColonSentinel));
            } else {
                args.push(self.parse_or_short()?);
            }
            if matches!(self.cur().kind, Tok::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> EvalResult<NodeId> {
        let loc = self.cur().loc;
        match self.cur().kind.clone() {
            Tok::Number(n) => {
                let text = self.cur().text.clone();
                self.advance();
                let num = self.ast.push(Node::Number(n));
                if text.ends_with('i') || text.ends_with('j') {
                    let i_ident = self.ast.push(Node::Ident("i".to_string()));
                    Ok(self.ast.push(Node::Binary(BinOp::MulElem, num, i_ident)))
                } else {
                    Ok(num)
                }
            }
            Tok::Str(s, q) => {
                self.advance();
                Ok(self.ast.push(Node::Str(s, q)))
            }
            Tok::Ident(name) => {
                self.advance();
                Ok(self.ast.push(Node::Ident(name)))
            }
            Tok::End => {
                self.advance();
                Ok(self.ast.push(Node::EndSentinel))
            }
            Tok::Colon => {
                self.advance();
                Ok(self.ast.push(Node::ColonSentinel))
            }
            Tok::LParen => {
                self.advance();
                let inner = self.parse_or_short()?;
                self.expect(&Tok::RParen)?;
                Ok(self.ast.push(Node::Paren(inner)))
            }
            Tok::LBracket => self.parse_matrix_literal(Delimiter::Bracket),
            Tok::LBrace => self.parse_matrix_literal(Delimiter::Brace),
            other => Err(EvalError::syntax(format!("unexpected token {other:?}")).with_loc(loc)),
        }
    }

    fn parse_matrix_literal(&mut self, delim: Delimiter) -> EvalResult<NodeId> {
        let (open, close) = match delim {
            Delimiter::Bracket => (Tok::LBracket, Tok::RBracket),
            Delimiter::Brace => (Tok::LBrace, Tok::RBrace),
        };
        self.expect(&open)?;
        let mut rows = Vec::new();
        let mut row = Vec::new();
        while std::mem::discriminant(&self.cur().kind) != std::mem::discriminant(&close) {
            while matches!(self.cur().kind, Tok::Newline) {
                self.advance();
            }
            if std::mem::discriminant(&self.cur().kind) == std::mem::discriminant(&close) {
                break;
            }
            row.push(self.parse_or_short()?);
            match self.cur().kind {
                Tok::Comma => {
                    self.advance();
                }
                Tok::Semicolon | Tok::Newline => {
                    self.advance();
                    rows.push(std::mem::take(&mut row));
                }
                _ => {
                    if std::mem::discriminant(&self.cur().kind) != std::mem::discriminant(&close) {
                        return Err(EvalError::syntax("expected ',', ';', or closing bracket in matrix literal").with_loc(self.cur().loc));
                    }
                }
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
        self.expect(&close)?;
        Ok(self.ast.push(Node::MatrixLiteral { rows, delim }))
    }
}
