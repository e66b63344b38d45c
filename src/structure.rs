//! Structure value (spec §3.1, §4.4): a mapping from field name to value.

use indexmap::IndexMap;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// A named-field structure. Field names are unique; insertion order is kept
/// only because `IndexMap` makes iteration deterministic for testing and
/// unparsing — spec §3.1 explicitly says order is "not observable" by any
/// operation, so nothing here depends on it semantically.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Structure {
    fields: IndexMap<String, Value>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `getField(struct, path)` — walks `path`, failing on any missing step
    /// (spec §4.4).
    pub fn get_field(&self, path: &[String]) -> EvalResult<Value> {
        let (head, rest) = path.split_first().ok_or_else(|| EvalError::evaluation("empty field path"))?;
        let value = self
            .fields
            .get(head)
            .ok_or_else(|| EvalError::evaluation(format!("no field '{head}'")))?;
        if rest.is_empty() {
            return Ok(value.clone());
        }
        match value {
            Value::Structure(inner) => inner.get_field(rest),
            _ => Err(EvalError::evaluation(format!("field '{head}' is not a struct"))),
        }
    }

    /// `setNewField(struct, path, value)` — walks `path`, creating empty
    /// structures at each missing intermediate step, and sets the leaf
    /// (spec §4.4).
    pub fn set_new_field(&mut self, path: &[String], value: Value) -> EvalResult<()> {
        let (head, rest) = path.split_first().ok_or_else(|| EvalError::evaluation("empty field path"))?;
        if rest.is_empty() {
            self.fields.insert(head.clone(), value);
            return Ok(());
        }
        let entry = self.fields.entry(head.clone()).or_insert_with(|| Value::Structure(Structure::new()));
        match entry {
            Value::Structure(inner) => inner.set_new_field(rest, value),
            _ => Err(EvalError::evaluation(format!("field '{head}' is not a struct"))),
        }
    }
}
