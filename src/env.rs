//! Evaluation environment (spec §3.3, §4.1, §5).
//!
//! A name table for user variables, a native table of builtin constants
//! re-seeded on a bare `clear`, a base function table of builtin
//! operations, a command-word table for bare-word statements (`clear x`,
//! `hold on`), an alias resolver, and a stack of local scopes for function
//! calls. Unlike the teacher crate's single flat randomized-iteration
//! namespace, scoping here is an explicit stack of frames (spec §9: "the
//! teacher's randomized flat-key scheme isn't needed here — replace it
//! with a plain scope stack").

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{EvalError, EvalResult};
use crate::numeric::{Complex, NumericContext, Real};
use crate::value::{ClassTag, Value};

/// Which arguments of a base function are passed unevaluated (AST nodes)
/// rather than values — needed for forms like `if`-adjacent short-circuit
/// operators and for functions that must see `end`/`:` sentinels directly.
#[derive(Debug, Clone, Default)]
pub struct LazyMask(pub Vec<bool>);

impl LazyMask {
    pub fn none(arity: usize) -> Self {
        LazyMask(vec![false; arity])
    }

    pub fn is_lazy(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }
}

pub type NativeFn = fn(&mut crate::eval::Evaluator, &[Value]) -> EvalResult<Vec<Value>>;

/// One entry in the base function table (spec §3.3).
#[derive(Clone)]
pub struct BaseFunction {
    pub name: String,
    /// Whether this function lifts over array arguments element-wise.
    pub mapper: bool,
    pub lazy_mask: LazyMask,
    pub implementation: NativeFn,
    /// Optional override used by the MathML unparser for decorative
    /// rendering (spec §4.6).
    pub mathml_override: Option<fn(&[String]) -> String>,
}

/// One local call frame: parameter bindings plus a RETLIST-producing
/// call's pending multi-values, looked up by name (spec §4.1 IDX
/// resolution: "a fresh local frame per call").
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub vars: IndexMap<String, Value>,
}

/// A user-defined function created by the `id(args) = expr` assignment
/// form (spec §4.1 rule 5). `body_ast` keeps the defining program's arena
/// alive so `body` stays a valid `NodeId` across later `evaluate` calls.
#[derive(Clone)]
pub struct UserFunction {
    pub params: Vec<String>,
    pub body_ast: std::rc::Rc<crate::ast::Ast>,
    pub body: crate::ast::NodeId,
}

pub struct Environment {
    /// User-assigned top-level names plus `ans`.
    pub names: IndexMap<String, Value>,
    /// Builtin constants, restored by a bare `clear` (spec §4.1).
    native_seed: HashMap<String, Value>,
    pub natives: HashMap<String, Value>,
    pub functions: HashMap<String, BaseFunction>,
    pub user_functions: HashMap<String, UserFunction>,
    /// Command words recognized without parentheses (`clear`, `hold`, ...).
    pub cmd_words: HashMap<String, NativeFn>,
    /// User-defined aliases resolved before function-table lookup.
    pub aliases: HashMap<String, String>,
    pub scopes: Vec<Scope>,
    pub numeric: NumericContext,
}

impl Environment {
    pub fn new(numeric: NumericContext) -> Self {
        let native_seed = default_native_seed(&numeric);
        Self {
            names: IndexMap::new(),
            natives: native_seed.clone(),
            native_seed,
            functions: HashMap::new(),
            user_functions: HashMap::new(),
            cmd_words: HashMap::new(),
            aliases: HashMap::new(),
            scopes: Vec::new(),
            numeric,
        }
    }

    /// Bare `clear`: drops all user names, keeps the native table fresh,
    /// and resets `ans` (spec §4.1, and the `clear`/`ans` scenario in §8).
    pub fn clear_all(&mut self) {
        self.names.clear();
        self.user_functions.clear();
        self.natives = self.native_seed.clone();
    }

    /// `clear x`: removes one name from whichever scope — local if inside
    /// a call, otherwise top-level (spec §9: "clear x double-scope
    /// removal" resolved to "innermost scope that has it wins").
    pub fn clear_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.vars.shift_remove(name).is_some() {
                return;
            }
        }
        self.names.shift_remove(name);
        self.user_functions.remove(name);
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Identifier resolution order: innermost local scope, then
    /// top-level user names, then the native constant table (spec §4.1).
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(scope) = self.scopes.last() {
            if let Some(v) = scope.vars.get(name) {
                return Some(v.clone());
            }
        }
        if let Some(v) = self.names.get(name) {
            return Some(v.clone());
        }
        self.natives.get(name).cloned()
    }

    /// Writes `name` into the innermost local scope if one is active,
    /// otherwise into the top-level name table.
    pub fn assign(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.vars.insert(name.to_string(), value);
        } else {
            self.names.insert(name.to_string(), value);
        }
    }

    /// True when `name` is unbound in every scope that matters for rule
    /// 5's function-definition-vs-indexed-assignment disambiguation
    /// (spec §4.1): local scope if active, else top-level names. Natives
    /// don't count — shadowing a constant with a fresh variable is legal.
    pub fn is_unbound_for_assignment(&self, name: &str) -> bool {
        if let Some(scope) = self.scopes.last() {
            return !scope.vars.contains_key(name);
        }
        !self.names.contains_key(name)
    }

    pub fn resolve_alias(&self, name: &str) -> String {
        self.aliases.get(name).cloned().unwrap_or_else(|| name.to_string())
    }

    pub fn register_function(&mut self, f: BaseFunction) {
        self.functions.insert(f.name.clone(), f);
    }

    pub fn register_cmd_word(&mut self, name: impl Into<String>, f: NativeFn) {
        self.cmd_words.insert(name.into(), f);
    }
}

fn default_native_seed(ctx: &NumericContext) -> HashMap<String, Value> {
    let mut m = HashMap::new();
    m.insert("false".to_string(), Value::logical(false));
    m.insert("true".to_string(), Value::logical(true));
    let i = Value::Scalar(Complex { re: Real::zero(), im: Real::one() }, ClassTag::Decimal);
    m.insert("i".to_string(), i.clone());
    m.insert("j".to_string(), i.clone());
    m.insert("I".to_string(), i.clone());
    m.insert("J".to_string(), i);
    m.insert("e".to_string(), Value::scalar(Complex::real(Real::from_f64(std::f64::consts::E, ctx))));
    m.insert("pi".to_string(), Value::scalar(Complex::real(Real::from_f64(std::f64::consts::PI, ctx))));
    m.insert("inf".to_string(), Value::scalar(Complex::real(Real::PosInf)));
    m.insert("Inf".to_string(), Value::scalar(Complex::real(Real::PosInf)));
    m.insert("nan".to_string(), Value::scalar(Complex::real(Real::NaN)));
    m.insert("NaN".to_string(), Value::scalar(Complex::real(Real::NaN)));
    m
}

/// Options accepted by `EvaluatorConfig::builder()` (spec A.3 in the
/// expanded ambient-stack spec). Unknown options don't exist at the type
/// level — there's no stringly-typed options bag to silently ignore.
#[derive(Clone, Default)]
pub struct EvaluatorConfig {
    pub alias_table: HashMap<String, String>,
    pub external_functions: Vec<BaseFunction>,
    pub external_cmd_words: Vec<(String, NativeFn)>,
    pub numeric: NumericContext,
    pub mathml_debug: bool,
}

impl EvaluatorConfig {
    pub fn builder() -> EvaluatorConfigBuilder {
        EvaluatorConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct EvaluatorConfigBuilder {
    cfg: EvaluatorConfig,
}

impl EvaluatorConfigBuilder {
    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.cfg.alias_table.insert(from.into(), to.into());
        self
    }

    pub fn external_function(mut self, f: BaseFunction) -> Self {
        self.cfg.external_functions.push(f);
        self
    }

    pub fn external_cmd_word(mut self, name: impl Into<String>, f: NativeFn) -> Self {
        self.cfg.external_cmd_words.push((name.into(), f));
        self
    }

    pub fn numeric(mut self, numeric: NumericContext) -> Self {
        self.cfg.numeric = numeric;
        self
    }

    pub fn mathml_debug(mut self, debug: bool) -> Self {
        self.cfg.mathml_debug = debug;
        self
    }

    pub fn build(self) -> EvaluatorConfig {
        self.cfg
    }
}

/// A lazily-produced multi-valued result (spec §4.1 "RETLIST"): a
/// function that, given the number of outputs requested and which one is
/// wanted, either returns that value or signals it wasn't produced.
#[derive(Clone)]
pub struct RetList {
    pub producer: std::rc::Rc<dyn Fn(usize, usize) -> EvalResult<Value>>,
}

impl RetList {
    pub fn new(producer: impl Fn(usize, usize) -> EvalResult<Value> + 'static) -> Self {
        Self { producer: std::rc::Rc::new(producer) }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(move |_expected, index| {
            values
                .get(index)
                .cloned()
                .ok_or_else(|| EvalError::evaluation(format!("element number {} undefined in return list", index + 1)))
        })
    }

    /// Auto-collapse used when a call isn't part of a multi-assignment:
    /// `select(1, 0)` (spec §4.1).
    pub fn select(&self, expected: usize, index: usize) -> EvalResult<Value> {
        (self.producer)(expected, index)
    }
}

impl std::fmt::Debug for RetList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RetList(..)")
    }
}
