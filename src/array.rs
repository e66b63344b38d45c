//! N-dimensional array value (spec §3.1, §4.3).
//!
//! Storage is row-major (spec §3.1's invariant), but *linear* indexing
//! ("a single subscript vector ... column-major order, matching MATLAB
//! semantics", spec §4.3) walks the array in column-major order. The two
//! orders are reconciled here by always converting a column-major linear
//! index into a per-dimension subscript vector first, then mapping that
//! subscript vector onto the row-major storage offset.

use crate::error::{EvalError, EvalResult};
use crate::numeric::NumericContext;
use crate::value::{ClassTag, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ElemKind {
    Numeric(ClassTag),
    Str,
    /// Only meaningful for cell arrays, which don't unify element types.
    Mixed,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MultiArray {
    /// Length >= 2, each entry >= 0 (spec §3.1).
    pub dims: Vec<usize>,
    pub elem_kind: ElemKind,
    pub cell: bool,
    /// Row-major contents; `product(dims) == data.len()`.
    pub data: Vec<Value>,
}

/// Translates a 0-based column-major linear index into per-dimension
/// subscripts (first dimension varies fastest).
fn col_major_subscripts(dims: &[usize], mut lin: usize) -> Vec<usize> {
    let mut idx = vec![0usize; dims.len()];
    for (k, slot) in idx.iter_mut().enumerate() {
        let d = dims[k].max(1);
        *slot = lin % d;
        lin /= d;
    }
    idx
}

/// Maps a per-dimension subscript vector onto a row-major flat offset.
fn subscripts_to_offset(dims: &[usize], idx: &[usize]) -> usize {
    idx.iter().zip(dims).fold(0usize, |acc, (i, d)| acc * d + i)
}

impl MultiArray {
    pub fn new(dims: Vec<usize>, elem_kind: ElemKind, cell: bool, data: Vec<Value>) -> Self {
        debug_assert!(dims.len() >= 2);
        debug_assert_eq!(dims.iter().product::<usize>(), data.len());
        Self { dims, elem_kind, cell, data }
    }

    pub fn scalar(v: Value) -> Self {
        let kind = Self::kind_of(&v);
        Self::new(vec![1, 1], kind, false, vec![v])
    }

    pub fn empty(elem_kind: ElemKind) -> Self {
        Self::new(vec![0, 0], elem_kind, false, vec![])
    }

    fn kind_of(v: &Value) -> ElemKind {
        match v {
            Value::Scalar(_, tag) => ElemKind::Numeric(*tag),
            Value::CharString(_) => ElemKind::Str,
            _ => ElemKind::Mixed,
        }
    }

    pub fn linear_length(&self) -> usize {
        self.dims.iter().product()
    }

    /// `getDimension(array, i)`: dimension `i` (0-based) with `i >= rank`
    /// yielding 1 (spec §4.3).
    pub fn get_dimension(&self, i: usize) -> usize {
        self.dims.get(i).copied().unwrap_or(1)
    }

    pub fn is_vector(&self) -> bool {
        self.dims.iter().filter(|&&d| d != 1).count() <= 1
    }

    pub fn is_row(&self) -> bool {
        self.dims.len() == 2 && self.dims[0] <= 1
    }

    /// Builds a matrix-literal array from evaluated rows (spec §4.3
    /// "Construction"), verifying all rows share the same width.
    pub fn from_rows(rows: Vec<Vec<Value>>, cell: bool) -> EvalResult<Self> {
        if rows.is_empty() {
            return Ok(Self::empty(ElemKind::Numeric(ClassTag::Decimal)));
        }
        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(EvalError::evaluation("matrix literal rows must have matching widths"));
        }
        let height = rows.len();
        let kind = rows
            .first()
            .and_then(|r| r.first())
            .map(Self::kind_of)
            .unwrap_or(ElemKind::Numeric(ClassTag::Decimal));
        let data = rows.into_iter().flatten().collect();
        Ok(Self::new(vec![height, width], if cell { ElemKind::Mixed } else { kind }, cell, data))
    }

    /// Builds a row vector from a `Range` expansion (spec §4.1 "Range").
    pub fn from_row_vector(values: Vec<Value>) -> Self {
        let kind = values.first().map(Self::kind_of).unwrap_or(ElemKind::Numeric(ClassTag::Decimal));
        let n = values.len();
        Self::new(vec![1, n], kind, false, values)
    }

    /// All-nonzero boolean reduction (spec §4.1 "if command").
    pub fn all_nonzero(&self, ctx: &NumericContext) -> bool {
        if self.data.is_empty() {
            return false;
        }
        self.data.iter().all(|v| v.to_bool(ctx))
    }

    /// Reads a single element at a 1-based column-major linear index.
    pub fn get_linear(&self, one_based_index: usize) -> EvalResult<&Value> {
        if one_based_index == 0 || one_based_index > self.linear_length() {
            return Err(EvalError::arithmetic(format!(
                "index {one_based_index} out of bounds for length {}",
                self.linear_length()
            )));
        }
        let idx = col_major_subscripts(&self.dims, one_based_index - 1);
        let offset = subscripts_to_offset(&self.dims, &idx);
        Ok(&self.data[offset])
    }

    /// Linear read with a vector of 1-based indices; returns a column
    /// vector when the subscript is a column, row otherwise (spec §4.3).
    pub fn index_linear(&self, indices: &[usize], subscript_is_row: bool) -> EvalResult<MultiArray> {
        let mut out = Vec::with_capacity(indices.len());
        for &i in indices {
            out.push(self.get_linear(i)?.clone());
        }
        let kind = out.first().map(Self::kind_of).unwrap_or(self.elem_kind);
        let dims = if subscript_is_row { vec![1, out.len()] } else { vec![out.len(), 1] };
        Ok(Self::new(dims, if self.cell { ElemKind::Mixed } else { kind }, self.cell, out))
    }

    /// Subscripted read: one index vector per dimension, result shape is
    /// the outer product of the subscript shapes (spec §4.3).
    pub fn index_subscripted(&self, subs: &[Vec<usize>]) -> EvalResult<MultiArray> {
        let rank = subs.len().max(self.dims.len());
        let mut dims = self.dims.clone();
        dims.resize(rank, 1);
        let out_dims: Vec<usize> = subs.iter().map(|s| s.len()).collect();
        let total: usize = out_dims.iter().product();
        let mut out = Vec::with_capacity(total);
        let mut counters = vec![0usize; subs.len()];
        for _ in 0..total {
            let idx: Vec<usize> = counters
                .iter()
                .zip(subs.iter())
                .map(|(&c, s)| s[c].checked_sub(1).unwrap_or(0))
                .collect();
            for (i, &d) in idx.iter().enumerate() {
                if d >= dims.get(i).copied().unwrap_or(1) {
                    return Err(EvalError::arithmetic(format!("index {} out of bounds in dimension {}", d + 1, i + 1)));
                }
            }
            let offset = subscripts_to_offset(&dims, &idx);
            out.push(self.data[offset].clone());
            // odometer increment, first dimension fastest
            for (c, s) in counters.iter_mut().zip(subs.iter()) {
                *c += 1;
                if *c < s.len() {
                    break;
                }
                *c = 0;
            }
        }
        let out_dims = if out_dims.len() < 2 {
            let mut d = out_dims;
            d.resize(2, 1);
            d
        } else {
            out_dims
        };
        let kind = out.first().map(Self::kind_of).unwrap_or(self.elem_kind);
        Ok(Self::new(out_dims, if self.cell { ElemKind::Mixed } else { kind }, self.cell, out))
    }

    /// Logical read: 1-based column-major positions where `mask` is truthy,
    /// returned as a column vector (spec §4.3).
    pub fn index_logical(&self, mask: &MultiArray, ctx: &NumericContext) -> EvalResult<MultiArray> {
        let positions = self.find_nonzero(mask, ctx)?;
        let mut out = Vec::with_capacity(positions.len());
        for p in &positions {
            out.push(self.get_linear(*p)?.clone());
        }
        let kind = out.first().map(Self::kind_of).unwrap_or(self.elem_kind);
        Ok(Self::new(vec![out.len(), 1], if self.cell { ElemKind::Mixed } else { kind }, self.cell, out))
    }

    /// `find(mask)`: 1-based column-major positions where `mask` is truthy.
    pub fn find_nonzero(&self, mask: &MultiArray, ctx: &NumericContext) -> EvalResult<Vec<usize>> {
        if mask.linear_length() != self.linear_length() {
            return Err(EvalError::evaluation("logical mask size does not match array size"));
        }
        let mut out = Vec::new();
        for i in 1..=mask.linear_length() {
            if mask.get_linear(i)?.to_bool(ctx) {
                out.push(i);
            }
        }
        Ok(out)
    }

    /// Writes a single value at a 1-based column-major linear index,
    /// extending a vector (or empty array) as needed (spec §4.1 rule 5).
    pub fn set_linear(&mut self, one_based_index: usize, value: Value) -> EvalResult<()> {
        if one_based_index == 0 {
            return Err(EvalError::arithmetic("index must be >= 1"));
        }
        if one_based_index > self.linear_length() {
            self.extend_linear(one_based_index)?;
        }
        let idx = col_major_subscripts(&self.dims, one_based_index - 1);
        let offset = subscripts_to_offset(&self.dims, &idx);
        self.data[offset] = value;
        Ok(())
    }

    fn default_fill(&self) -> Value {
        match self.elem_kind {
            ElemKind::Str => Value::string("", crate::value::QuoteStyle::Double),
            ElemKind::Mixed => Value::from_i64(0),
            ElemKind::Numeric(tag) => Value::Scalar(crate::numeric::Complex::zero(), tag),
        }
    }

    /// Grows a vector-shaped (or empty) array so a linear index up to
    /// `needed_len` is valid. Non-vector arrays cannot be grown this way
    /// (spec §4.1: "governed by the usual MATLAB-style linear/2-D/N-D
    /// rules" — out-of-bounds linear writes to a genuine matrix are a
    /// shape error rather than silently reshaping it).
    fn extend_linear(&mut self, needed_len: usize) -> EvalResult<()> {
        if self.linear_length() == 0 {
            self.dims = vec![1, needed_len];
            self.data = (0..needed_len).map(|_| self.default_fill()).collect();
            return Ok(());
        }
        if !self.is_vector() {
            return Err(EvalError::evaluation("out-of-bounds linear assignment into a non-vector array"));
        }
        let fill = self.default_fill();
        if self.is_row() {
            self.dims[1] = needed_len;
        } else {
            self.dims[0] = needed_len;
        }
        self.data.resize(needed_len, fill);
        Ok(())
    }

    /// Subscripted write, extending each dimension to fit out-of-bounds
    /// subscripts (spec §4.1 rule 5).
    pub fn set_subscripted(&mut self, subs: &[Vec<usize>], values: &[Value]) -> EvalResult<()> {
        let rank = subs.len().max(self.dims.len());
        let mut new_dims = self.dims.clone();
        new_dims.resize(rank, 1);
        for (dim, sub) in subs.iter().enumerate() {
            if let Some(&max_idx) = sub.iter().max() {
                new_dims[dim] = new_dims[dim].max(max_idx);
            }
        }
        if new_dims != self.dims {
            self.reshape_preserving(new_dims);
        }
        let out_dims: Vec<usize> = subs.iter().map(|s| s.len()).collect();
        let total: usize = out_dims.iter().product();
        if values.len() != total && values.len() != 1 {
            return Err(EvalError::evaluation("assignment shape mismatch"));
        }
        let mut counters = vec![0usize; subs.len()];
        for i in 0..total {
            let idx: Vec<usize> = counters.iter().zip(subs.iter()).map(|(&c, s)| s[c] - 1).collect();
            let offset = subscripts_to_offset(&self.dims, &idx);
            self.data[offset] = if values.len() == 1 { values[0].clone() } else { values[i].clone() };
            for (c, s) in counters.iter_mut().zip(subs.iter()) {
                *c += 1;
                if *c < s.len() {
                    break;
                }
                *c = 0;
            }
        }
        Ok(())
    }

    /// Rebuilds `data` for a larger `new_dims`, copying every existing
    /// element to its new row-major offset and filling new slots with the
    /// default fill value.
    fn reshape_preserving(&mut self, new_dims: Vec<usize>) {
        let fill = self.default_fill();
        let new_total: usize = new_dims.iter().product();
        let mut new_data = vec![fill; new_total];
        let old_total = self.linear_length();
        let mut old_dims = self.dims.clone();
        old_dims.resize(new_dims.len(), 1);
        for lin in 0..old_total {
            let idx = col_major_subscripts(&old_dims, lin);
            if idx.iter().zip(&new_dims).any(|(&i, &d)| i >= d) {
                continue;
            }
            let old_offset = subscripts_to_offset(&old_dims, &idx);
            let new_offset = subscripts_to_offset(&new_dims, &idx);
            new_data[new_offset] = self.data[old_offset].clone();
        }
        self.dims = new_dims;
        self.data = new_data;
    }

    /// Logical write: a scalar broadcasts, otherwise `values` must match
    /// the number of truthy positions (spec §4.3).
    pub fn set_logical(&mut self, mask: &MultiArray, values: &[Value], ctx: &NumericContext) -> EvalResult<()> {
        let positions = self.find_nonzero(mask, ctx)?;
        if values.len() != 1 && values.len() != positions.len() {
            return Err(EvalError::evaluation("logical assignment shape mismatch"));
        }
        for (i, pos) in positions.into_iter().enumerate() {
            let v = if values.len() == 1 { values[0].clone() } else { values[i].clone() };
            self.set_linear(pos, v)?;
        }
        Ok(())
    }

    /// Element-wise binary operator with scalar broadcasting (spec §4.3).
    pub fn elementwise<F>(&self, other: &MultiArray, mut f: F) -> EvalResult<MultiArray>
    where
        F: FnMut(&Value, &Value) -> EvalResult<Value>,
    {
        let self_scalar = self.linear_length() == 1;
        let other_scalar = other.linear_length() == 1;
        if !self_scalar && !other_scalar && self.dims != other.dims {
            return Err(EvalError::evaluation("array dimensions must agree for element-wise operation"));
        }
        let out_dims = if self_scalar { other.dims.clone() } else { self.dims.clone() };
        let n: usize = out_dims.iter().product();
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let a = if self_scalar { &self.data[0] } else { &self.data[i] };
            let b = if other_scalar { &other.data[0] } else { &other.data[i] };
            out.push(f(a, b)?);
        }
        let kind = out.first().map(Self::kind_of).unwrap_or(ElemKind::Numeric(ClassTag::Decimal));
        Ok(Self::new(out_dims, kind, false, out))
    }

    /// Mapper lifting: applies a scalar function element-wise, preserving
    /// shape (spec §4.3 "Mapper lifting").
    pub fn map_elements<F>(&self, mut f: F) -> EvalResult<MultiArray>
    where
        F: FnMut(&Value) -> EvalResult<Value>,
    {
        let mut out = Vec::with_capacity(self.data.len());
        for v in &self.data {
            out.push(f(v)?);
        }
        let kind = out.first().map(Self::kind_of).unwrap_or(self.elem_kind);
        Ok(Self::new(self.dims.clone(), kind, self.cell, out))
    }
}
