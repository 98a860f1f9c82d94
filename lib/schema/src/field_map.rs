//! Cross-domain field names
//!
//! Catalog features describe what a job *requires* (`creativity_requirement`);
//! profiles describe what a person *has* (`creativity_score`). A [`FieldMap`]
//! pairs the two vocabularies explicitly. Catalog features with no pair read
//! as zero at match time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default `(catalog feature, profile field)` pairs.
pub const DEFAULT_FIELD_PAIRS: &[(&str, &str)] = &[
    ("verbal_aptitude_weight", "psychometric_aptitude_verbal"),
    ("quantitative_aptitude_weight", "psychometric_aptitude_quantitative"),
    ("creativity_requirement", "creativity_score"),
    ("teamwork_requirement", "teamwork_score"),
    ("exploration_requirement", "exploration_work_score"),
    ("salary_inr_avg", "expected_salary"),
];

/// Catalog-feature to profile-field mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    catalog_to_profile: BTreeMap<String, String>,
}

impl FieldMap {
    /// An empty map: every catalog feature is unmapped.
    pub fn empty() -> Self {
        Self {
            catalog_to_profile: BTreeMap::new(),
        }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = Self::empty();
        for (catalog, profile) in pairs {
            map.insert(catalog, profile);
        }
        map
    }

    pub fn insert(&mut self, catalog_feature: &str, profile_field: &str) {
        self.catalog_to_profile
            .insert(catalog_feature.to_string(), profile_field.to_string());
    }

    /// Profile field paired with a catalog feature.
    pub fn profile_field(&self, catalog_feature: &str) -> Option<&str> {
        self.catalog_to_profile.get(catalog_feature).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.catalog_to_profile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog_to_profile.is_empty()
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_FIELD_PAIRS.iter().copied())
    }
}
