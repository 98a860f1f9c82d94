//! # Pathwise Core
//!
//! Core library for the Pathwise career recommender.
//!
//! This crate provides the clustering and matching engine:
//!
//! - [`Catalog`] / [`FeatureSelector`] - job records and the feature matrix built from them
//! - [`ScalingModel`] - column-wise standardization with median imputation
//! - [`RecursiveSplitter`] - silhouette-gated recursive binary splitting
//! - [`ClusterSet`] - per-cluster centroid, size, top jobs and categories
//! - [`MatchContext`] - cosine nearest-centroid matching of external profiles
//! - [`ModelBuilder`] - the full offline pipeline producing a [`CareerModel`]
//!
//! ## Example
//!
//! ```rust
//! use pathwise_core::{BuildConfig, Catalog, ItemRecord, ModelBuilder};
//! use pathwise_schema::{CategoricalMapping, ExternalProfile};
//!
//! let records = (0..8u64)
//!     .map(|i| {
//!         let salary = if i < 4 { 300_000.0 } else { 1_800_000.0 };
//!         ItemRecord::new(i, format!("Job {i}"), "General")
//!             .with_attribute("salary_inr_avg", salary + i as f64)
//!             .with_attribute("creativity_requirement", (i % 4) as f64)
//!     })
//!     .collect();
//! let catalog = Catalog::from_records(records).unwrap();
//!
//! let model = ModelBuilder::new(BuildConfig::default())
//!     .build(catalog, CategoricalMapping::new())
//!     .unwrap();
//!
//! let mut profile = ExternalProfile::new();
//! profile.insert("expected_salary", 1_000_000.0);
//! let matches = model.match_profile(&profile, 1).unwrap();
//! assert_eq!(matches.len(), 1);
//! ```

pub mod agglomerative;
pub mod catalog;
pub mod error;
pub mod matcher;
pub mod matrix;
pub mod metadata;
pub mod model;
pub mod scaler;
pub mod silhouette;
pub mod splitter;
pub mod vector;

pub use agglomerative::{Agglomerative, BinarySplitter, Linkage};
pub use catalog::{Catalog, FeatureSelector, ItemRecord, OrdinalEncoding, DECLARED_NUMERIC_FEATURES};
pub use error::{Error, Result};
pub use matcher::{ClusterMatch, MatchContext, ProfileVector};
pub use matrix::FeatureMatrix;
pub use metadata::{build_cluster_metadata, ClusterMetadata, ClusterSet, MetadataConfig};
pub use model::{BuildConfig, CareerModel, ModelBuilder};
pub use scaler::ScalingModel;
pub use silhouette::silhouette_score;
pub use splitter::{ClusterNode, RecursiveSplitter, SplitConfig, SplitOutcome};
pub use vector::Vector;
