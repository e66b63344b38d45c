//! The tree-walking evaluator: operator dispatch, assignment, indexing,
//! and the four public entry points `parse` / `evaluate` / `unparse` /
//! `unparseMathML` (spec §4.1).

use crate::array::{ElemKind, MultiArray};
use crate::ast::{Ast, BinOp, Delimiter, FieldName, Node, NodeId, Statement, UnOp};
use crate::builtins;
use crate::env::{Environment, EvaluatorConfig, RetList, UserFunction};
use crate::error::{EvalError, EvalResult};
use crate::frontend;
use crate::mathml;
use crate::numeric::{Complex, Real};
use crate::structure::Structure;
use crate::unparse::{self, Unparsable};
use crate::value::{ClassTag, QuoteStyle, Value};

/// Outcome status of a top-level `evaluate` call (expanded ambient-stack
/// spec, front-end section: mirrors a REPL's exit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ExitStatus {
    #[strum(serialize = "OK")]
    Ok,
    LexError,
    ParserError,
    EvalError,
    Warning,
    External,
}

/// One top-level statement's result, as surfaced to the host program.
#[derive(Debug, Clone)]
pub struct StatementResult {
    pub value: Option<Value>,
    pub echoed: bool,
}

/// The overall result of evaluating a parsed program.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub exit_status: ExitStatus,
    pub message: Option<String>,
    pub results: Vec<StatementResult>,
}

pub struct Evaluator {
    pub env: Environment,
    pub mathml_debug: bool,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        let mathml_debug = config.mathml_debug;
        let mut env = Environment::new(config.numeric);
        builtins::register_all(&mut env);
        for (from, to) in config.alias_table {
            env.aliases.insert(from, to);
        }
        for f in config.external_functions {
            env.register_function(f);
        }
        for (name, f) in config.external_cmd_words {
            env.register_cmd_word(name, f);
        }
        Self { env, mathml_debug }
    }

    /// Parses source text into an `Ast` (front end, ambient-stack spec
    /// section B). Lexer/parser failures surface as `ErrorKind::Syntax`.
    pub fn parse(&self, source: &str) -> EvalResult<Ast> {
        frontend::parse(source)
    }

    /// Evaluates every top-level statement of `ast` in order, updating
    /// `ans` after each one that produces a value (spec §4.1).
    pub fn evaluate(&mut self, ast: &Ast) -> EvalOutcome {
        let mut results = Vec::with_capacity(ast.statements.len());
        for stmt in &ast.statements {
            match self.eval_statement(ast, stmt) {
                Ok(value) => {
                    if let Some(v) = &value {
                        self.env.assign("ans", v.clone());
                    }
                    results.push(StatementResult { value, echoed: !stmt.suppressed });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "evaluation failed");
                    return EvalOutcome { exit_status: ExitStatus::EvalError, message: Some(e.to_string()), results };
                }
            }
        }
        EvalOutcome { exit_status: ExitStatus::Ok, message: None, results }
    }

    /// Renders an AST or a bare value back to canonical text (spec §4.1,
    /// §4.5: `unparse(ast | value) -> string`).
    pub fn unparse<'a>(&self, input: impl Into<Unparsable<'a>>) -> String {
        unparse::unparse_program(input)
    }

    /// Renders an AST or a bare value as self-contained presentation
    /// MathML (spec §4.1, §4.6: `unparseMathML(ast | value, ...)`).
    pub fn unparse_mathml<'a>(&self, input: impl Into<Unparsable<'a>>, display_block: bool) -> String {
        mathml::unparse_program(input, display_block, self.mathml_debug, &self.env)
    }

    fn eval_statement(&mut self, ast: &Ast, stmt: &Statement) -> EvalResult<Option<Value>> {
        match ast.get(stmt.root) {
            Node::CmdWList { name, args } => {
                self.eval_cmd_word(name, args)?;
                Ok(None)
            }
            Node::Assign { .. } => {
                self.eval_assign(ast, stmt.root)?;
                Ok(None)
            }
            _ => {
                let loc = stmt.loc;
                let v = self.eval_node(ast, stmt.root).map_err(|e| if e.loc.is_none() { e.with_loc(loc) } else { e })?;
                Ok(Some(v))
            }
        }
    }

    fn eval_cmd_word(&mut self, name: &str, args: &[String]) -> EvalResult<()> {
        let resolved = self.env.resolve_alias(name);
        if resolved == "clear" {
            if args.is_empty() {
                tracing::info!("clear: resetting entire environment");
                self.env.clear_all();
            } else {
                tracing::info!(names = ?args, "clear: removing named bindings");
                for a in args {
                    self.env.clear_name(a);
                }
            }
            return Ok(());
        }
        if let Some(f) = self.env.cmd_words.get(resolved.as_str()).copied() {
            let values: Vec<Value> = args.iter().map(|a| Value::string(a.clone(), QuoteStyle::Single)).collect();
            f(self, &values)?;
            return Ok(());
        }
        Err(EvalError::reference(format!("'{name}' is not a recognized command")))
    }

    // ---- core recursive evaluation --------------------------------------

    pub fn eval_node(&mut self, ast: &Ast, id: NodeId) -> EvalResult<Value> {
        match ast.get(id).clone() {
            Node::Number(n) => Ok(Value::scalar(Complex::real(Real::from_f64(n, &self.env.numeric)))),
            Node::Str(s, q) => Ok(Value::string(s, q)),
            Node::Ident(name) => self.eval_ident(&name),
            Node::EndSentinel => self.eval_end_sentinel(ast, id),
            Node::ColonSentinel => Err(EvalError::syntax("':' used outside an index expression")),
            Node::WildcardSentinel => Err(EvalError::syntax("'~' used outside an output list")),
            Node::Paren(inner) => self.eval_node(ast, inner),
            Node::Unary(op, operand) => {
                let v = self.eval_node(ast, operand)?;
                self.eval_unary(op, &v)
            }
            Node::Binary(op, lhs, rhs) => {
                if matches!(op, BinOp::AndShort) {
                    let l = self.eval_node(ast, lhs)?;
                    if !l.to_bool(&self.env.numeric) {
                        return Ok(Value::logical(false));
                    }
                    let r = self.eval_node(ast, rhs)?;
                    return Ok(Value::logical(r.to_bool(&self.env.numeric)));
                }
                if matches!(op, BinOp::OrShort) {
                    let l = self.eval_node(ast, lhs)?;
                    if l.to_bool(&self.env.numeric) {
                        return Ok(Value::logical(true));
                    }
                    let r = self.eval_node(ast, rhs)?;
                    return Ok(Value::logical(r.to_bool(&self.env.numeric)));
                }
                let l = self.eval_node(ast, lhs)?;
                let r = self.eval_node(ast, rhs)?;
                self.eval_binary(op, &l, &r)
            }
            Node::Range { start, stride, stop } => self.eval_range(ast, start, stride, stop),
            Node::MatrixLiteral { rows, delim } => self.eval_matrix_literal(ast, &rows, delim),
            Node::Field { target, name } => self.eval_field(ast, target, &name),
            Node::Idx { target, args, .. } => {
                let outputs = self.eval_idx_multi(ast, target, &args, 1)?;
                outputs.select(1, 0)
            }
            Node::RetListSelect { call, expected, index } => {
                let Node::Idx { target, args, .. } = ast.get(call).clone() else {
                    return Err(EvalError::evaluation("RETLIST adapter must wrap an indexing/call node"));
                };
                let outputs = self.eval_idx_multi(ast, target, &args, expected)?;
                outputs.select(expected, index)
            }
            Node::List { .. } => Err(EvalError::evaluation("output list may only appear on the left of an assignment")),
            Node::Assign { .. } => {
                self.eval_assign(ast, id)?;
                self.env.lookup("ans").ok_or_else(|| EvalError::evaluation("assignment produced no value"))
            }
            Node::If { branches, else_body } => self.eval_if(ast, &branches, &else_body),
            Node::CmdWList { name, args } => {
                self.eval_cmd_word(&name, &args)?;
                Ok(Value::from_i64(0))
            }
        }
    }

    fn eval_ident(&mut self, name: &str) -> EvalResult<Value> {
        let resolved = self.env.resolve_alias(name);
        if let Some(v) = self.env.lookup(&resolved) {
            return Ok(v);
        }
        if self.env.functions.contains_key(resolved.as_str()) || self.env.user_functions.contains_key(resolved.as_str()) {
            // A bare reference to a callable name invokes it with no args.
            let outputs = self.call_named(&resolved, &[])?;
            return outputs.select(1, 0);
        }
        Err(EvalError::reference(format!("'{name}' is undefined")))
    }

    fn eval_end_sentinel(&mut self, ast: &Ast, id: NodeId) -> EvalResult<Value> {
        let (idx_node, pos) = ast
            .enclosing_idx(id)
            .ok_or_else(|| EvalError::syntax("'end' used outside an index expression"))?;
        let Node::Idx { target, args, .. } = ast.get(idx_node).clone() else {
            unreachable!("enclosing_idx always returns an Idx node");
        };
        let target_val = self.eval_node(ast, target)?;
        let len = dimension_length(&target_val, pos, args.len());
        Ok(Value::from_i64(len as i64))
    }

    fn eval_unary(&mut self, op: UnOp, v: &Value) -> EvalResult<Value> {
        let ctx = self.env.numeric;
        match op {
            UnOp::Plus => Ok(v.clone()),
            UnOp::Neg => map_numeric(v, |c| c.neg(), &ctx),
            UnOp::Not => match v {
                Value::Scalar(c, _) => Ok(Value::logical(!c.to_bool())),
                Value::MultiArray(a) => a.map_elements(|e| Ok(Value::logical(!e.to_bool(&ctx)))).map(Value::MultiArray),
                _ => Err(EvalError::evaluation("'!' requires a numeric operand")),
            },
            UnOp::Transpose | UnOp::CTranspose => self.transpose(v, matches!(op, UnOp::CTranspose)),
        }
    }

    fn transpose(&self, v: &Value, conjugate: bool) -> EvalResult<Value> {
        match v {
            Value::Scalar(c, tag) => Ok(Value::Scalar(if conjugate { c.conj() } else { c.clone() }, *tag)),
            Value::MultiArray(a) if a.dims.len() == 2 => {
                let (rows, cols) = (a.dims[0], a.dims[1]);
                let mut data = Vec::with_capacity(a.data.len());
                for c in 0..cols {
                    for r in 0..rows {
                        let v = &a.data[r * cols + c];
                        data.push(match (conjugate, v) {
                            (true, Value::Scalar(cx, tag)) => Value::Scalar(cx.conj(), *tag),
                            _ => v.clone(),
                        });
                    }
                }
                Ok(Value::MultiArray(MultiArray::new(vec![cols, rows], a.elem_kind, a.cell, data)))
            }
            _ => Err(EvalError::evaluation("transpose requires a 2-D array")),
        }
    }

    fn eval_binary(&mut self, op: BinOp, l: &Value, r: &Value) -> EvalResult<Value> {
        let ctx = self.env.numeric;
        match op {
            BinOp::Add => elementwise_binary(l, r, &ctx, |a, b, ctx| a.add(b, ctx)),
            BinOp::Sub => elementwise_binary(l, r, &ctx, |a, b, ctx| a.sub(b, ctx)),
            BinOp::MulElem => elementwise_binary(l, r, &ctx, |a, b, ctx| a.mul(b, ctx)),
            BinOp::DivElem => elementwise_binary(l, r, &ctx, |a, b, ctx| a.div_right(b, ctx)),
            BinOp::LeftDivElem => elementwise_binary(l, r, &ctx, |a, b, ctx| a.div_left(b, ctx)),
            BinOp::PowElem => elementwise_binary(l, r, &ctx, |a, b, ctx| a.pow(b, ctx)),
            BinOp::Mul => self.matrix_mul(l, r),
            BinOp::Div => self.matrix_div(l, r, false),
            BinOp::LeftDiv => self.matrix_div(l, r, true),
            BinOp::Pow => elementwise_binary(l, r, &ctx, |a, b, ctx| a.pow(b, ctx)),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne => self.eval_compare(op, l, r),
            BinOp::And => elementwise_logical(l, r, &ctx, |a, b| a && b),
            BinOp::Or => elementwise_logical(l, r, &ctx, |a, b| a || b),
            BinOp::AndShort | BinOp::OrShort => unreachable!("short-circuit ops handled in eval_node"),
        }
    }

    /// `*` on two scalars is the same as `.*`; between arrays it currently
    /// falls back to element-wise with broadcasting, since this language
    /// has no linear-algebra matrix product in its base function table.
    fn matrix_mul(&mut self, l: &Value, r: &Value) -> EvalResult<Value> {
        let ctx = self.env.numeric;
        elementwise_binary(l, r, &ctx, |a, b, ctx| a.mul(b, ctx))
    }

    fn matrix_div(&mut self, l: &Value, r: &Value, left: bool) -> EvalResult<Value> {
        let ctx = self.env.numeric;
        if left {
            elementwise_binary(l, r, &ctx, |a, b, ctx| a.div_left(b, ctx))
        } else {
            elementwise_binary(l, r, &ctx, |a, b, ctx| a.div_right(b, ctx))
        }
    }

    fn eval_compare(&mut self, op: BinOp, l: &Value, r: &Value) -> EvalResult<Value> {
        let ctx = self.env.numeric;
        let cmp = |a: &Complex, b: &Complex, ctx: &crate::numeric::NumericContext| -> bool {
            use std::cmp::Ordering::*;
            match op {
                BinOp::Eq => a.eq_display(b, ctx),
                BinOp::Ne => !a.eq_display(b, ctx),
                BinOp::Lt => a.cmp_polar(b, ctx) == Less,
                BinOp::Le => a.cmp_polar(b, ctx) != Greater,
                BinOp::Gt => a.cmp_polar(b, ctx) == Greater,
                BinOp::Ge => a.cmp_polar(b, ctx) != Less,
                _ => unreachable!(),
            }
        };
        match (l, r) {
            (Value::Scalar(a, _), Value::Scalar(b, _)) => Ok(Value::logical(cmp(a, b, &ctx))),
            (Value::CharString(a), Value::CharString(b)) => match op {
                BinOp::Eq => Ok(Value::logical(a == b)),
                BinOp::Ne => Ok(Value::logical(a != b)),
                _ => Err(EvalError::evaluation("only == and ~= are defined between strings")),
            },
            _ => {
                let la = as_scalar_or_array(l)?;
                let ra = as_scalar_or_array(r)?;
                la.elementwise(&ra, |a, b| {
                    let (ac, bc) = (scalar_complex(a)?, scalar_complex(b)?);
                    Ok(Value::logical(cmp(&ac, &bc, &ctx)))
                })
                .map(Value::MultiArray)
            }
        }
    }

    fn eval_range(&mut self, ast: &Ast, start: NodeId, stride: Option<NodeId>, stop: NodeId) -> EvalResult<Value> {
        let ctx = self.env.numeric;
        let start = scalar_complex(&self.eval_node(ast, start)?)?;
        let stop = scalar_complex(&self.eval_node(ast, stop)?)?;
        let stride = match stride {
            Some(s) => scalar_complex(&self.eval_node(ast, s)?)?,
            None => Complex::from_i64(1),
        };
        if stride.re.is_zero() {
            return Ok(Value::MultiArray(MultiArray::empty(ElemKind::Numeric(ClassTag::Decimal))));
        }
        let (mut x, stop_f, stride_f) = (start.re.to_f64(), stop.re.to_f64(), stride.re.to_f64());
        let mut values = Vec::new();
        let going_up = stride_f > 0.0;
        loop {
            if going_up && x > stop_f + 1e-9 {
                break;
            }
            if !going_up && x < stop_f - 1e-9 {
                break;
            }
            values.push(Value::scalar(Complex::real(Real::from_f64(x, &ctx))));
            x += stride_f;
            if values.len() > 10_000_000 {
                return Err(EvalError::evaluation("range expansion exceeded the maximum element count"));
            }
        }
        Ok(Value::MultiArray(MultiArray::from_row_vector(values)))
    }

    fn eval_matrix_literal(&mut self, ast: &Ast, rows: &[Vec<NodeId>], delim: Delimiter) -> EvalResult<Value> {
        let cell = matches!(delim, Delimiter::Brace);
        let mut out_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let mut spread_row = Vec::new();
            for &node in row {
                let v = self.eval_node(ast, node)?;
                match v {
                    Value::MultiArray(a) if !cell && a.is_row() => spread_row.extend(a.data),
                    other => spread_row.push(other),
                }
            }
            out_rows.push(spread_row);
        }
        MultiArray::from_rows(out_rows, cell).map(Value::MultiArray)
    }

    fn eval_field(&mut self, ast: &Ast, target: NodeId, name: &FieldName) -> EvalResult<Value> {
        let target_val = self.eval_node(ast, target)?;
        let field_name = match name {
            FieldName::Static(s) => s.clone(),
            FieldName::Dynamic(expr) => {
                let v = self.eval_node(ast, *expr)?;
                match v {
                    Value::CharString(s) => s.as_string(),
                    _ => return Err(EvalError::evaluation("dynamic field name must be a string")),
                }
            }
        };
        match target_val {
            Value::Structure(s) => s.get_field(&[field_name]),
            _ => Err(EvalError::evaluation("field access requires a struct")),
        }
    }

    fn eval_if(&mut self, ast: &Ast, branches: &[(NodeId, Vec<NodeId>)], else_body: &[NodeId]) -> EvalResult<Value> {
        for (cond, body) in branches {
            let c = self.eval_node(ast, *cond)?;
            if c.to_bool(&self.env.numeric) {
                return self.eval_body(ast, body);
            }
        }
        self.eval_body(ast, else_body)
    }

    fn eval_body(&mut self, ast: &Ast, body: &[NodeId]) -> EvalResult<Value> {
        let mut last = Value::from_i64(0);
        for &stmt in body {
            if let Node::Assign { .. } = ast.get(stmt) {
                self.eval_assign(ast, stmt)?;
                last = self.env.lookup("ans").unwrap_or(last);
            } else {
                last = self.eval_node(ast, stmt)?;
            }
        }
        Ok(last)
    }

    // ---- assignment (spec §4.1 rule 5) ----------------------------------

    fn eval_assign(&mut self, ast: &Ast, assign_id: NodeId) -> EvalResult<()> {
        let Node::Assign { lhs, rhs } = ast.get(assign_id).clone() else {
            return Err(EvalError::evaluation("not an assignment"));
        };
        match ast.get(lhs).clone() {
            Node::List { elements } => {
                let expected = elements.len();
                let retlist = self.eval_rhs_as_retlist(ast, rhs, expected)?;
                for (i, elem) in elements.iter().enumerate() {
                    if matches!(ast.get(*elem), Node::WildcardSentinel) {
                        continue;
                    }
                    let value = retlist.select(expected, i)?;
                    self.assign_target(ast, *elem, value)?;
                }
                Ok(())
            }
            _ => {
                // Rule 5: `id(args) = expr` defines a function iff every
                // index argument is an identifier currently unbound.
                if let Node::Idx { target, args, delim: Delimiter::Bracket } = ast.get(lhs).clone() {
                    if let Node::Ident(fname) = ast.get(target).clone() {
                        if !args.is_empty() {
                            let is_def = self.is_function_definition(ast, &args);
                            tracing::debug!(name = %fname, is_def, "assignment-target disambiguation");
                            if is_def {
                                return self.define_function(ast, &fname, &args, rhs);
                            }
                        }
                    }
                }
                let value = match self.eval_rhs_or_keep_unevaluated(ast, rhs) {
                    Ok(v) => v,
                    Err(e) => return Err(e),
                };
                self.assign_target(ast, lhs, value)
            }
        }
    }

    /// Evaluates the right side of an assignment. On failure, spec §7's
    /// error-catch point applies at the call site that needs the AST, not
    /// here — this just surfaces the error for the caller to decide.
    fn eval_rhs_or_keep_unevaluated(&mut self, ast: &Ast, rhs: NodeId) -> EvalResult<Value> {
        self.eval_node(ast, rhs)
    }

    fn is_function_definition(&self, ast: &Ast, args: &[NodeId]) -> bool {
        args.iter().all(|&a| match ast.get(a) {
            Node::Ident(name) => self.env.is_unbound_for_assignment(name),
            _ => false,
        })
    }

    fn define_function(&mut self, ast: &Ast, name: &str, args: &[NodeId], body: NodeId) -> EvalResult<()> {
        let params = args
            .iter()
            .map(|&a| match ast.get(a) {
                Node::Ident(n) => n.clone(),
                _ => unreachable!("checked by is_function_definition"),
            })
            .collect();
        self.env.user_functions.insert(
            name.to_string(),
            UserFunction { params, body_ast: std::rc::Rc::new(ast.clone()), body },
        );
        Ok(())
    }

    fn assign_target(&mut self, ast: &Ast, target: NodeId, value: Value) -> EvalResult<()> {
        match ast.get(target).clone() {
            Node::Ident(name) => {
                self.env.assign(&name, value);
                Ok(())
            }
            Node::Idx { target: inner, args, .. } => self.assign_indexed(ast, inner, &args, value),
            Node::Field { .. } => {
                let (var, path) = self.field_path(ast, target)?;
                self.assign_field_path(&var, &path, value)
            }
            Node::WildcardSentinel => Ok(()),
            _ => Err(EvalError::evaluation("invalid assignment target")),
        }
    }

    fn assign_indexed(&mut self, ast: &Ast, base: NodeId, args: &[NodeId], value: Value) -> EvalResult<()> {
        let Node::Ident(name) = ast.get(base).clone() else {
            return Err(EvalError::evaluation("indexed assignment target must be a variable"));
        };
        let mut current = self.env.lookup(&name).unwrap_or_else(|| Value::MultiArray(MultiArray::empty(ElemKind::Numeric(ClassTag::Decimal))));
        self.apply_indexed_write(ast, &mut current, args, value)?;
        self.env.assign(&name, current);
        Ok(())
    }

    fn apply_indexed_write(&mut self, ast: &Ast, current: &mut Value, args: &[NodeId], value: Value) -> EvalResult<()> {
        let array = match current {
            Value::MultiArray(a) => a,
            Value::Scalar(_, _) => {
                *current = Value::MultiArray(MultiArray::scalar(current.clone()));
                match current {
                    Value::MultiArray(a) => a,
                    _ => unreachable!(),
                }
            }
            _ => return Err(EvalError::evaluation("cannot index-assign into this value")),
        };
        if args.len() == 1 {
            if matches!(ast.get(args[0]), Node::ColonSentinel) {
                let n = array.linear_length();
                let values = broadcast_values(&value, n)?;
                for (i, v) in values.into_iter().enumerate() {
                    array.set_linear(i + 1, v)?;
                }
                return Ok(());
            }
            let arg_val = self.eval_node(ast, args[0])?;
            if is_logical_value(&arg_val) {
                let flat = flatten_values(&value);
                let ctx = self.env.numeric;
                let mask = as_scalar_or_array(&arg_val)?;
                return array.set_logical(&mask, &flat, &ctx);
            }
            let indices = value_to_indices(&arg_val)?;
            let flat = flatten_values(&value);
            if flat.len() == 1 {
                for i in indices {
                    array.set_linear(i, flat[0].clone())?;
                }
            } else {
                if flat.len() != indices.len() {
                    return Err(EvalError::evaluation("assignment shape mismatch"));
                }
                for (i, v) in indices.into_iter().zip(flat) {
                    array.set_linear(i, v)?;
                }
            }
            return Ok(());
        }
        let mut subs = Vec::with_capacity(args.len());
        for (pos, &arg_id) in args.iter().enumerate() {
            if matches!(ast.get(arg_id), Node::ColonSentinel) {
                let len = dimension_length_of_array(array, pos, args.len()).max(1);
                subs.push((1..=len).collect());
                continue;
            }
            let v = self.eval_node(ast, arg_id)?;
            subs.push(value_to_indices(&v)?);
        }
        let flat = flatten_values(&value);
        array.set_subscripted(&subs, &flat)
    }

    /// Walks a (possibly nested) `Field` chain down to its root identifier,
    /// collecting every field name along the way in outer-to-inner order
    /// (spec §4.4: `s.a.b` is a two-element path rooted at `s`).
    fn field_path(&mut self, ast: &Ast, node: NodeId) -> EvalResult<(String, Vec<String>)> {
        match ast.get(node).clone() {
            Node::Ident(name) => Ok((name, Vec::new())),
            Node::Field { target, name } => {
                let (var, mut path) = self.field_path(ast, target)?;
                let field_name = match name {
                    FieldName::Static(s) => s,
                    FieldName::Dynamic(expr) => match self.eval_node(ast, expr)? {
                        Value::CharString(s) => s.as_string(),
                        _ => return Err(EvalError::evaluation("dynamic field name must be a string")),
                    },
                };
                path.push(field_name);
                Ok((var, path))
            }
            _ => Err(EvalError::evaluation("field assignment target must be a variable")),
        }
    }

    fn assign_field_path(&mut self, var: &str, path: &[String], value: Value) -> EvalResult<()> {
        let mut current = match self.env.lookup(var) {
            Some(Value::Structure(s)) => s,
            Some(_) => return Err(EvalError::evaluation(format!("'{var}' is not a struct"))),
            None => Structure::new(),
        };
        current.set_new_field(path, value)?;
        self.env.assign(var, Value::Structure(current));
        Ok(())
    }

    // ---- RETLIST / function calls ---------------------------------------

    fn eval_rhs_as_retlist(&mut self, ast: &Ast, rhs: NodeId, expected: usize) -> EvalResult<RetList> {
        if let Node::Idx { target, args, delim: Delimiter::Bracket } = ast.get(rhs).clone() {
            return self.eval_idx_multi(ast, target, &args, expected);
        }
        if let Node::Ident(name) = ast.get(rhs).clone() {
            let resolved = self.env.resolve_alias(&name);
            if self.env.functions.contains_key(resolved.as_str()) || self.env.user_functions.contains_key(resolved.as_str()) {
                return self.call_named(&resolved, &[]);
            }
        }
        let v = self.eval_node(ast, rhs)?;
        Ok(RetList::from_values(vec![v]))
    }

    /// Dispatches an `Idx` node: indexing into a bound variable, or a
    /// call to a base/user function (spec §4.1).
    fn eval_idx_multi(&mut self, ast: &Ast, target: NodeId, args: &[NodeId], expected: usize) -> EvalResult<RetList> {
        if let Node::Ident(name) = ast.get(target).clone() {
            let resolved = self.env.resolve_alias(&name);
            if self.env.lookup(&resolved).is_none()
                && (self.env.functions.contains_key(resolved.as_str()) || self.env.user_functions.contains_key(resolved.as_str()))
            {
                let mut values = Vec::with_capacity(args.len());
                for &a in args {
                    values.push(self.eval_node(ast, a)?);
                }
                return self.call_named(&resolved, &values);
            }
            if let Some(v) = self.env.lookup(&resolved) {
                let indexed = self.eval_idx_on_value(ast, v, args)?;
                return Ok(RetList::from_values(vec![indexed]));
            }
            return Err(EvalError::reference(format!("'{name}' is undefined")));
        }
        let target_val = self.eval_node(ast, target)?;
        let indexed = self.eval_idx_on_value(ast, target_val, args)?;
        Ok(RetList::from_values(vec![indexed]))
    }

    fn call_named(&mut self, name: &str, args: &[Value]) -> EvalResult<RetList> {
        tracing::trace!(name, argc = args.len(), "call enter");
        let result = self.call_named_inner(name, args);
        tracing::trace!(name, ok = result.is_ok(), "call exit");
        result
    }

    fn call_named_inner(&mut self, name: &str, args: &[Value]) -> EvalResult<RetList> {
        if let Some(f) = self.env.functions.get(name).cloned() {
            if f.mapper {
                return self.call_mapper(&f, args).map(RetList::from_values);
            }
            let outputs = (f.implementation)(self, args)?;
            return Ok(RetList::from_values(outputs));
        }
        if let Some(uf) = self.env.user_functions.get(name).cloned() {
            if uf.params.len() != args.len() {
                return Err(EvalError::evaluation(format!("'{name}' expects {} argument(s)", uf.params.len())));
            }
            self.env.push_scope();
            for (p, v) in uf.params.iter().zip(args) {
                self.env.scopes.last_mut().unwrap().vars.insert(p.clone(), v.clone());
            }
            let body_ast = uf.body_ast.clone();
            let result = self.eval_node(&body_ast, uf.body);
            self.env.pop_scope();
            let v = result?;
            return Ok(RetList::from_values(vec![v]));
        }
        Err(EvalError::reference(format!("'{name}' is undefined")))
    }

    fn call_mapper(&mut self, f: &crate::env::BaseFunction, args: &[Value]) -> EvalResult<Vec<Value>> {
        if args.len() == 1 {
            if let Value::MultiArray(a) = &args[0] {
                let implementation = f.implementation;
                let out = a.map_elements(|v| {
                    let mut outs = implementation(&mut *self, std::slice::from_ref(v))?;
                    if outs.is_empty() {
                        return Err(EvalError::evaluation("mapper function produced no output"));
                    }
                    Ok(outs.remove(0))
                })?;
                return Ok(vec![Value::MultiArray(out)]);
            }
        }
        if args.len() == 2 {
            if matches!(&args[0], Value::MultiArray(_)) || matches!(&args[1], Value::MultiArray(_)) {
                let a = as_scalar_or_array(&args[0])?;
                let b = as_scalar_or_array(&args[1])?;
                let implementation = f.implementation;
                let out = a.elementwise(&b, |x, y| {
                    let mut outs = implementation(&mut *self, &[x.clone(), y.clone()])?;
                    if outs.is_empty() {
                        return Err(EvalError::evaluation("mapper function produced no output"));
                    }
                    Ok(outs.remove(0))
                })?;
                return Ok(vec![Value::MultiArray(out)]);
            }
        }
        (f.implementation)(self, args)
    }

    fn eval_idx_on_value(&mut self, ast: &Ast, target: Value, args: &[NodeId]) -> EvalResult<Value> {
        if args.len() == 1 {
            if matches!(ast.get(args[0]), Node::ColonSentinel) {
                return colon_flatten(&target);
            }
            let arg_val = self.eval_node(ast, args[0])?;
            if is_logical_value(&arg_val) {
                let ctx = self.env.numeric;
                return index_logical(&target, &arg_val, &ctx);
            }
            let row = value_is_row(&arg_val);
            let indices = value_to_indices(&arg_val)?;
            return index_linear(&target, &indices, row);
        }
        let mut subs = Vec::with_capacity(args.len());
        for (pos, &arg_id) in args.iter().enumerate() {
            if matches!(ast.get(arg_id), Node::ColonSentinel) {
                let len = dimension_length(&target, pos, args.len());
                subs.push((1..=len).collect());
                continue;
            }
            let v = self.eval_node(ast, arg_id)?;
            subs.push(value_to_indices(&v)?);
        }
        index_subscripted(&target, &subs)
    }
}

// ---- free helper functions ----------------------------------------------

fn scalar_complex(v: &Value) -> EvalResult<Complex> {
    match v {
        Value::Scalar(c, _) => Ok(c.clone()),
        Value::MultiArray(a) if a.linear_length() == 1 => scalar_complex(&a.data[0]),
        _ => Err(EvalError::evaluation("expected a scalar value")),
    }
}

fn map_numeric(v: &Value, f: impl Fn(&Complex) -> Complex + Copy, ctx: &crate::numeric::NumericContext) -> EvalResult<Value> {
    let _ = ctx;
    match v {
        Value::Scalar(c, tag) => Ok(Value::Scalar(f(c), *tag)),
        Value::MultiArray(a) => a
            .map_elements(|e| match e {
                Value::Scalar(c, tag) => Ok(Value::Scalar(f(c), *tag)),
                _ => Err(EvalError::evaluation("numeric operator requires numeric elements")),
            })
            .map(Value::MultiArray),
        _ => Err(EvalError::evaluation("numeric operator requires a numeric operand")),
    }
}

fn as_scalar_or_array(v: &Value) -> EvalResult<MultiArray> {
    match v {
        Value::Scalar(_, _) => Ok(MultiArray::scalar(v.clone())),
        Value::MultiArray(a) => Ok(a.clone()),
        _ => Err(EvalError::evaluation("expected a numeric value")),
    }
}

fn elementwise_binary(
    l: &Value,
    r: &Value,
    ctx: &crate::numeric::NumericContext,
    f: impl Fn(&Complex, &Complex, &crate::numeric::NumericContext) -> Complex,
) -> EvalResult<Value> {
    match (l, r) {
        (Value::Scalar(a, ta), Value::Scalar(b, tb)) => {
            let tag = if *ta == ClassTag::Logical && *tb == ClassTag::Logical { ClassTag::Logical } else { ClassTag::Decimal };
            Ok(Value::Scalar(f(a, b, ctx), tag))
        }
        _ => {
            let la = as_scalar_or_array(l)?;
            let ra = as_scalar_or_array(r)?;
            la.elementwise(&ra, |a, b| {
                let (ac, bc) = (scalar_complex(a)?, scalar_complex(b)?);
                Ok(Value::scalar(f(&ac, &bc, ctx)))
            })
            .map(Value::MultiArray)
        }
    }
}

fn elementwise_logical(l: &Value, r: &Value, ctx: &crate::numeric::NumericContext, f: impl Fn(bool, bool) -> bool) -> EvalResult<Value> {
    match (l, r) {
        (Value::Scalar(_, _), Value::Scalar(_, _)) => Ok(Value::logical(f(l.to_bool(ctx), r.to_bool(ctx)))),
        _ => {
            let la = as_scalar_or_array(l)?;
            let ra = as_scalar_or_array(r)?;
            la.elementwise(&ra, |a, b| Ok(Value::logical(f(a.to_bool(ctx), b.to_bool(ctx))))).map(Value::MultiArray)
        }
    }
}

fn is_logical_value(v: &Value) -> bool {
    match v {
        Value::Scalar(_, ClassTag::Logical) => true,
        Value::MultiArray(a) => matches!(a.elem_kind, ElemKind::Numeric(ClassTag::Logical)),
        _ => false,
    }
}

fn value_is_row(v: &Value) -> bool {
    match v {
        Value::MultiArray(a) => a.is_row(),
        _ => true,
    }
}

fn value_to_indices(v: &Value) -> EvalResult<Vec<usize>> {
    match v {
        Value::Scalar(c, _) => Ok(vec![to_one_based_index(c)?]),
        Value::MultiArray(a) => a.data.iter().map(|e| scalar_complex(e).and_then(|c| to_one_based_index(&c))).collect(),
        _ => Err(EvalError::evaluation("subscript must be numeric")),
    }
}

fn to_one_based_index(c: &Complex) -> EvalResult<usize> {
    let n = c.re.to_f64();
    if n.fract() != 0.0 || n < 1.0 {
        return Err(EvalError::arithmetic(format!("subscript {n} is not a valid positive integer index")));
    }
    Ok(n as usize)
}

fn flatten_values(v: &Value) -> Vec<Value> {
    match v {
        Value::MultiArray(a) => a.data.clone(),
        other => vec![other.clone()],
    }
}

fn broadcast_values(v: &Value, n: usize) -> EvalResult<Vec<Value>> {
    let flat = flatten_values(v);
    if flat.len() == 1 {
        Ok(std::iter::repeat(flat[0].clone()).take(n).collect())
    } else if flat.len() == n {
        Ok(flat)
    } else {
        Err(EvalError::evaluation("assignment shape mismatch"))
    }
}

fn dimension_length(v: &Value, pos: usize, rank: usize) -> usize {
    match v {
        Value::MultiArray(a) => dimension_length_of_array(a, pos, rank),
        Value::CharString(s) => if pos == 0 { 1 } else { s.len() },
        _ => 1,
    }
}

fn dimension_length_of_array(a: &MultiArray, pos: usize, rank: usize) -> usize {
    if pos + 1 == rank && rank < a.dims.len() {
        a.dims[pos..].iter().product()
    } else {
        a.get_dimension(pos)
    }
}

fn colon_flatten(v: &Value) -> EvalResult<Value> {
    match v {
        Value::MultiArray(a) => {
            let n = a.linear_length();
            let indices: Vec<usize> = (1..=n).collect();
            a.index_linear(&indices, false).map(Value::MultiArray)
        }
        Value::Scalar(_, _) => Ok(v.clone()),
        _ => Err(EvalError::evaluation("':' indexing requires a numeric array")),
    }
}

fn index_linear(v: &Value, indices: &[usize], row: bool) -> EvalResult<Value> {
    match v {
        Value::MultiArray(a) => a.index_linear(indices, row).map(Value::MultiArray),
        Value::Scalar(_, _) => {
            if indices == [1] {
                Ok(v.clone())
            } else {
                Err(EvalError::arithmetic("scalar index out of bounds"))
            }
        }
        Value::CharString(s) => {
            let chars: EvalResult<Vec<char>> = indices
                .iter()
                .map(|&i| s.chars.get(i - 1).copied().ok_or_else(|| EvalError::arithmetic("string index out of bounds")))
                .collect();
            Ok(Value::string(chars?.into_iter().collect::<String>(), s.quote))
        }
        _ => Err(EvalError::evaluation("value is not indexable")),
    }
}

fn index_subscripted(v: &Value, subs: &[Vec<usize>]) -> EvalResult<Value> {
    match v {
        Value::MultiArray(a) => a.index_subscripted(subs).map(Value::MultiArray),
        Value::Scalar(_, _) if subs.iter().all(|s| s == &[1]) => Ok(v.clone()),
        _ => Err(EvalError::evaluation("N-D subscripting requires an array")),
    }
}

fn index_logical(v: &Value, mask: &Value, ctx: &crate::numeric::NumericContext) -> EvalResult<Value> {
    let a = as_scalar_or_array(v)?;
    let m = as_scalar_or_array(mask)?;
    a.index_logical(&m, ctx).map(Value::MultiArray)
}
