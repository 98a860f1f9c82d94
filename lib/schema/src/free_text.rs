//! Free-text profile extraction
//!
//! Turns loose text such as `age: 17; stream: Science; expected_salary: 1500000`
//! into an [`ExternalProfile`]. Explicit `key: value` / `key=value` pairs win;
//! a few well-known numeric fields are otherwise recovered by pattern.

use crate::mapping::{CategoricalMapping, UNKNOWN_CATEGORY};
use crate::profile::ExternalProfile;
use crate::value::FieldValue;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const SCORE_FIELDS: &[&str] = &["math_score", "english_score", "science_score", "academic_average"];

struct Patterns {
    separators: Regex,
    age: Regex,
    expected_salary: Regex,
    scores: Vec<(&'static str, Regex)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        separators: Regex::new(r"[\n;]+").expect("valid separator pattern"),
        age: Regex::new(r"(?i)\b(age)\D*(\d{1,2})\b").expect("valid age pattern"),
        expected_salary: Regex::new(r"(?i)expected[_ ]?salary\D*([0-9,]+)")
            .expect("valid salary pattern"),
        scores: SCORE_FIELDS
            .iter()
            .map(|field| {
                let pattern = format!(r"(?i)\b{}\D*(\d{{1,3}}(?:\.\d+)?)", field.replace('_', "[ _]?"));
                (*field, Regex::new(&pattern).expect("valid score pattern"))
            })
            .collect(),
    })
}

/// Parse free text into a profile, optionally encoding categorical values
/// through `mapping` (unknown values become [`UNKNOWN_CATEGORY`]).
pub fn profile_from_free_text(text: &str, mapping: Option<&CategoricalMapping>) -> ExternalProfile {
    let patterns = patterns();
    let mut raw: BTreeMap<String, FieldValue> = BTreeMap::new();

    for part in patterns.separators.split(text) {
        if part.trim().is_empty() {
            continue;
        }
        if let Some((key, value)) = split_pair(part) {
            raw.insert(key.trim().to_string(), FieldValue::parse(value));
        }
    }

    if !raw.contains_key("age") {
        if let Some(age) = patterns
            .age
            .captures(text)
            .and_then(|c| c.get(2))
            .and_then(|m| m.as_str().parse::<f64>().ok())
        {
            raw.insert("age".to_string(), FieldValue::Number(age));
        }
    }

    if !raw.contains_key("expected_salary") {
        if let Some(salary) = patterns
            .expected_salary
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        {
            raw.insert("expected_salary".to_string(), FieldValue::Number(salary));
        }
    }

    for (field, regex) in &patterns.scores {
        if raw.contains_key(*field) {
            continue;
        }
        if let Some(score) = regex
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
        {
            raw.insert(field.to_string(), FieldValue::Number(score));
        }
    }

    let profile: ExternalProfile = raw
        .into_iter()
        .map(|(k, v)| (normalize_key(&k), v))
        .collect();

    match mapping {
        Some(m) if !m.is_empty() => m.apply_to_profile(&profile, UNKNOWN_CATEGORY),
        _ => profile,
    }
}

/// Split on the first `:`; fall back to the first `=`.
fn split_pair(s: &str) -> Option<(&str, &str)> {
    s.split_once(':').or_else(|| s.split_once('='))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}
