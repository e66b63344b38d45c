//! A tree-walking evaluator for a MATLAB/Octave-patterned matrix language:
//! arbitrary-precision complex scalars, N-D arrays, structures, a
//! hand-written front end, and text/MathML unparsers.

mod array;
mod ast;
mod builtins;
mod env;
mod error;
mod eval;
mod frontend;
mod mathml;
mod numeric;
mod structure;
mod unparse;
mod value;

pub use crate::array::{ElemKind, MultiArray};
pub use crate::ast::{Ast, BinOp, Delimiter, FieldName, Node, NodeId, Statement, UnOp};
pub use crate::env::{BaseFunction, Environment, EvaluatorConfig, LazyMask, RetList, Scope, UserFunction};
pub use crate::error::{CodeLoc, ErrorKind, EvalError, EvalResult};
pub use crate::eval::{EvalOutcome, Evaluator, ExitStatus, StatementResult};
pub use crate::numeric::{Complex, NumericContext, Real};
pub use crate::structure::Structure;
pub use crate::unparse::Unparsable;
pub use crate::value::{CharString, ClassTag, QuoteStyle, Value, format_complex};
