//! External profiles
//!
//! An [`ExternalProfile`] is the free-form description of a person supplied
//! at inference time. Keys are not required to match catalog column names;
//! alignment happens later through a [`FieldMap`](crate::FieldMap).

use crate::error::{Result, SchemaError};
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Unordered `field name -> value` mapping describing one person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalProfile {
    fields: BTreeMap<String, FieldValue>,
}

impl ExternalProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a profile from a JSON object.
    ///
    /// Numbers and strings map directly, booleans become `1`/`0`. Nulls,
    /// arrays and objects are skipped.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| SchemaError::ProfileNotObject(json_kind(value).to_string()))?;

        let mut profile = Self::new();
        for (key, field) in object {
            let resolved = match field {
                Value::Null => continue,
                Value::Bool(b) => FieldValue::Number(if *b { 1.0 } else { 0.0 }),
                Value::Number(n) => match n.as_f64() {
                    Some(f) => FieldValue::Number(f),
                    None => return Err(SchemaError::UnsupportedValue(key.clone())),
                },
                Value::String(s) => FieldValue::Text(s.clone()),
                Value::Array(_) | Value::Object(_) => {
                    tracing::debug!(field = %key, kind = json_kind(field), "skipping nested profile field");
                    continue;
                }
            };
            profile.fields.insert(key.clone(), resolved);
        }
        Ok(profile)
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<FieldValue>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Numeric reading of a field; `None` when absent or non-numeric.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(FieldValue::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for ExternalProfile {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut profile = Self::new();
        for (k, v) in iter {
            profile.insert(k, v);
        }
        profile
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
