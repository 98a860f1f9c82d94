//! Categorical mapping table
//!
//! A mapping table is a list of `(column, original_value, encoded_value)`
//! rows. It is loaded into a nested map `column -> raw value -> encoding`
//! and used to normalize categorical cells on both sides of the match: the
//! catalog at build time and incoming profiles at inference time.

use crate::profile::ExternalProfile;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Encoding given to categorical values absent from the table.
pub const UNKNOWN_CATEGORY: f64 = -1.0;

/// One raw row of a mapping table. Any field may be missing in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingRow {
    pub column: Option<String>,
    pub original_value: Option<String>,
    pub encoded_value: Option<String>,
}

impl MappingRow {
    pub fn new(column: &str, original_value: &str, encoded_value: &str) -> Self {
        Self {
            column: Some(column.to_string()),
            original_value: Some(original_value.to_string()),
            encoded_value: Some(encoded_value.to_string()),
        }
    }
}

/// Nested `column -> (raw value -> encoded value)` lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoricalMapping {
    columns: BTreeMap<String, BTreeMap<String, FieldValue>>,
}

impl CategoricalMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from table rows.
    ///
    /// Rows with a missing field are skipped. Encoded values resolve to
    /// `Number` when they parse as integer or float and stay `Text`
    /// otherwise. Original values are stored trimmed.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = MappingRow>,
    {
        let mut mapping = Self::new();
        for (index, row) in rows.into_iter().enumerate() {
            match (row.column, row.original_value, row.encoded_value) {
                (Some(column), Some(original), Some(encoded)) => {
                    mapping.insert(&column, &original, FieldValue::parse(&encoded));
                }
                _ => tracing::debug!(row = index, "skipping incomplete mapping row"),
            }
        }
        mapping
    }

    pub fn insert(&mut self, column: &str, original_value: &str, encoded: FieldValue) {
        self.columns
            .entry(column.to_string())
            .or_default()
            .insert(original_value.trim().to_string(), encoded);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of mapped columns
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Exact lookup of a trimmed raw value.
    pub fn lookup(&self, column: &str, raw: &str) -> Option<&FieldValue> {
        self.columns.get(column)?.get(raw.trim())
    }

    /// Lookup that also tries title, upper and lower case variants of the key.
    pub fn lookup_normalized(&self, column: &str, raw: &str) -> Option<&FieldValue> {
        let table = self.columns.get(column)?;
        let key = raw.trim();
        table
            .get(key)
            .or_else(|| table.get(&title_case(key)))
            .or_else(|| table.get(&key.to_uppercase()))
            .or_else(|| table.get(&key.to_lowercase()))
    }

    /// Catalog-side encoding: the cell's string form is looked up exactly;
    /// missing cells and unknown values encode to [`UNKNOWN_CATEGORY`].
    pub fn encode_raw(&self, column: &str, raw: Option<&FieldValue>) -> FieldValue {
        raw.and_then(|value| self.lookup(column, &value.to_string()))
            .cloned()
            .unwrap_or(FieldValue::Number(UNKNOWN_CATEGORY))
    }

    /// Encode the categorical fields of a profile.
    ///
    /// Numeric values are left as they are. Text values are looked up with
    /// [`lookup_normalized`](Self::lookup_normalized); values with no entry
    /// become `Number(default_value)`. Fields without a mapped column are
    /// copied through unchanged.
    pub fn apply_to_profile(&self, profile: &ExternalProfile, default_value: f64) -> ExternalProfile {
        let mut out = profile.clone();
        for column in self.columns.keys() {
            let Some(FieldValue::Text(raw)) = profile.get(column) else {
                continue;
            };
            let encoded = self
                .lookup_normalized(column, raw)
                .cloned()
                .unwrap_or(FieldValue::Number(default_value));
            out.insert(column.clone(), encoded);
        }
        out
    }
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mapping() -> CategoricalMapping {
        CategoricalMapping::from_rows(vec![
            MappingRow::new("stream", "Science", "2"),
            MappingRow::new("stream", "Arts", "0"),
            MappingRow::new("job_seeking_preference", "On-Site", "2"),
            MappingRow::new("grade", "XII", "12"),
            MappingRow::new("band", "Upper", "top"),
        ])
    }

    #[test]
    fn test_from_rows_resolves_types() {
        let mapping = sample_mapping();
        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping.lookup("stream", "Science"), Some(&FieldValue::Number(2.0)));
        assert_eq!(mapping.lookup("band", "Upper"), Some(&FieldValue::Text("top".into())));
    }

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let mapping = CategoricalMapping::from_rows(vec![
            MappingRow {
                column: Some("stream".into()),
                original_value: None,
                encoded_value: Some("1".into()),
            },
            MappingRow::new("stream", " Commerce ", "1"),
        ]);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.lookup("stream", "Commerce"), Some(&FieldValue::Number(1.0)));
    }

    #[test]
    fn test_lookup_normalized_case_variants() {
        let mapping = sample_mapping();
        assert_eq!(mapping.lookup_normalized("stream", "science"), Some(&FieldValue::Number(2.0)));
        assert_eq!(
            mapping.lookup_normalized("job_seeking_preference", "on-site"),
            Some(&FieldValue::Number(2.0))
        );
        assert_eq!(mapping.lookup_normalized("grade", "xii"), Some(&FieldValue::Number(12.0)));
        assert_eq!(mapping.lookup_normalized("stream", "law"), None);
    }

    #[test]
    fn test_encode_raw_unknown_and_missing() {
        let mapping = sample_mapping();
        assert_eq!(
            mapping.encode_raw("stream", Some(&FieldValue::Text("Arts".into()))),
            FieldValue::Number(0.0)
        );
        assert_eq!(
            mapping.encode_raw("stream", Some(&FieldValue::Text("arts".into()))),
            FieldValue::Number(UNKNOWN_CATEGORY)
        );
        assert_eq!(mapping.encode_raw("stream", None), FieldValue::Number(UNKNOWN_CATEGORY));
    }

    #[test]
    fn test_apply_to_profile() {
        let mapping = sample_mapping();
        let mut profile = ExternalProfile::new();
        profile.insert("stream", "science");
        profile.insert("grade", 11.0);
        profile.insert("job_seeking_preference", "Remote");
        profile.insert("age", 17.0);

        let encoded = mapping.apply_to_profile(&profile, UNKNOWN_CATEGORY);
        assert_eq!(encoded.get("stream"), Some(&FieldValue::Number(2.0)));
        assert_eq!(encoded.get("grade"), Some(&FieldValue::Number(11.0)));
        assert_eq!(
            encoded.get("job_seeking_preference"),
            Some(&FieldValue::Number(UNKNOWN_CATEGORY))
        );
        assert_eq!(encoded.get("age"), Some(&FieldValue::Number(17.0)));
        // input untouched
        assert_eq!(profile.get("stream"), Some(&FieldValue::Text("science".into())));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("very hard"), "Very Hard");
        assert_eq!(title_case("on-site"), "On-Site");
        assert_eq!(title_case("DATA science"), "Data Science");
    }
}
