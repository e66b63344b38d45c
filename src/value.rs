//! The value universe (spec §3.1): Scalar, CharString, MultiArray, Structure.

use std::fmt;

use crate::array::MultiArray;
use crate::numeric::{Complex, NumericContext, Real};
use crate::structure::Structure;

/// Quote style a string literal was written with, kept for unparse
/// fidelity (spec §3.1: "immutable after construction").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum QuoteStyle {
    Single,
    Double,
}

/// A scalar's class tag. Logical scalars carry only 0 or 1 in both real and
/// imaginary parts (spec §3.1 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClassTag {
    Decimal,
    Logical,
}

/// An immutable character string value.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CharString {
    pub chars: Vec<char>,
    pub quote: QuoteStyle,
}

impl CharString {
    pub fn new(text: impl Into<String>, quote: QuoteStyle) -> Self {
        Self { chars: text.into().chars().collect(), quote }
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl PartialEq for CharString {
    fn eq(&self, other: &Self) -> bool {
        self.chars == other.chars
    }
}

/// The value universe: exactly one of Scalar, CharString, MultiArray, or
/// Structure (spec §3.1).
///
/// Scalars and strings are value types, copied on mutation. MultiArray and
/// Structure have logical identity only at the environment entry that names
/// them — every read materializes an independent clone, every write
/// replaces the entry. `Value` derives `Clone` for exactly that reason; there
/// is no shared, aliasable heap here (unlike the teacher crate's refcounted
/// arena, which this language's simpler value semantics don't require).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Scalar(Complex, ClassTag),
    CharString(CharString),
    MultiArray(MultiArray),
    Structure(Structure),
}

impl Value {
    pub fn scalar(c: Complex) -> Self {
        Value::Scalar(c, ClassTag::Decimal)
    }

    pub fn logical(b: bool) -> Self {
        Value::Scalar(Complex::from_i64(b as i64), ClassTag::Logical)
    }

    pub fn from_i64(v: i64) -> Self {
        Value::scalar(Complex::from_i64(v))
    }

    pub fn string(s: impl Into<String>, quote: QuoteStyle) -> Self {
        Value::CharString(CharString::new(s, quote))
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Value::Scalar(_, ClassTag::Logical))
    }

    /// The truthiness used by `if` conditions and logical operators (spec
    /// §4.1 "if command": "all non-zero" for arrays, direct for scalars).
    pub fn to_bool(&self, ctx: &NumericContext) -> bool {
        match self {
            Value::Scalar(c, _) => c.to_bool(),
            Value::CharString(s) => !s.is_empty(),
            Value::MultiArray(a) => a.all_nonzero(ctx),
            Value::Structure(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_, ClassTag::Logical) => "logical",
            Value::Scalar(_, ClassTag::Decimal) => "double",
            Value::CharString(_) => "char",
            Value::MultiArray(_) => "array",
            Value::Structure(_) => "struct",
        }
    }

    /// Collapses to a plain 1x1 scalar MultiArray view where one is needed,
    /// without changing the stored representation (scalars are already
    /// representable as `dims = [1,1]` per spec §3.1).
    pub fn as_scalar_complex(&self) -> Option<&Complex> {
        match self {
            Value::Scalar(c, _) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassTag::Decimal => write!(f, "decimal"),
            ClassTag::Logical => write!(f, "logical"),
        }
    }
}

/// Formats a `Complex` the way a 1x1 scalar renders in text output: bare
/// real part, or `a+bi` / `a-bi` form when the imaginary part is nonzero.
pub fn format_complex(c: &Complex) -> String {
    if c.im.is_zero() {
        format_real(&c.re)
    } else if matches!(&c.re, Real::Finite(b) if bigdecimal::Zero::is_zero(b)) {
        format!("{}i", format_real(&c.im))
    } else {
        let im = format_real(&c.im.abs());
        let sign = if c.im.is_negative() { '-' } else { '+' };
        format!("{}{}{}i", format_real(&c.re), sign, im)
    }
}

fn format_real(r: &Real) -> String {
    r.to_string()
}
