//! Error taxonomy for the evaluator (spec §7).
//!
//! Mirrors the teacher crate's `ExcType` / `RunError` split: a closed enum of
//! error *kinds* plus a single error struct that carries a kind, a message,
//! and (when available) the source location of the statement being
//! evaluated.

use std::fmt;

use thiserror::Error;

/// The four error kinds the core evaluator can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorKind {
    /// A name was read but is unbound.
    Reference,
    /// A semantic failure: wrong arity, invalid left side, etc.
    Evaluation,
    /// A context-only token (`end`, `:`) used outside its context, or a
    /// malformed program surfaced by the front end.
    Syntax,
    /// Factorial's domain guard, or invalid matrix indexing.
    Arithmetic,
}

/// Source position of a top-level statement, attached by the front end
/// (spec §6: "The parser must attach source `{line, column}` positions to
/// each top-level statement node").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A raised evaluator error.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct EvalError {
    pub kind: ErrorKind,
    pub message: String,
    pub loc: Option<CodeLoc>,
}

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            loc: None,
        }
    }

    pub fn with_loc(mut self, loc: CodeLoc) -> Self {
        self.loc = Some(loc);
        self
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, message)
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Evaluation, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arithmetic, message)
    }
}

/// Result alias used throughout the crate, analogous to the teacher's
/// `RunResult<T>`.
pub type EvalResult<T> = Result<T, EvalError>;
