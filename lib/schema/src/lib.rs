//! # Pathwise Schema
//!
//! Value types shared by the catalog and the matcher.
//!
//! ## Overview
//!
//! Career catalogs and candidate profiles speak different vocabularies and
//! mix numeric and categorical cells. This crate resolves both into typed
//! values before any numeric code sees them:
//!
//! - [`FieldValue`] - a tagged `Number | Text` cell value
//! - [`CategoricalMapping`] - the `column -> raw value -> encoding` table
//! - [`ExternalProfile`] - a free-form candidate description
//! - [`FieldMap`] - explicit catalog-feature / profile-field pairs
//! - [`profile_from_free_text`] - heuristic extraction from loose text
//!
//! ## Example
//!
//! ```rust
//! use pathwise_schema::{CategoricalMapping, ExternalProfile, FieldValue, MappingRow, UNKNOWN_CATEGORY};
//!
//! let mapping = CategoricalMapping::from_rows(vec![
//!     MappingRow::new("stream", "Science", "2"),
//! ]);
//!
//! let mut profile = ExternalProfile::new();
//! profile.insert("stream", "science");
//! profile.insert("expected_salary", 1_500_000.0);
//!
//! let encoded = mapping.apply_to_profile(&profile, UNKNOWN_CATEGORY);
//! assert_eq!(encoded.get("stream"), Some(&FieldValue::Number(2.0)));
//! ```

pub mod error;
pub mod field_map;
pub mod free_text;
pub mod mapping;
pub mod profile;
pub mod value;

pub use error::{Result, SchemaError};
pub use field_map::{FieldMap, DEFAULT_FIELD_PAIRS};
pub use free_text::profile_from_free_text;
pub use mapping::{CategoricalMapping, MappingRow, UNKNOWN_CATEGORY};
pub use profile::ExternalProfile;
pub use value::FieldValue;
