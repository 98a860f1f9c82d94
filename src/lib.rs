//! # Pathwise
//!
//! Career recommendation by recursive cluster splitting and centroid
//! matching.
//!
//! A catalog of jobs is standardized, split into homogeneous clusters by
//! silhouette-gated recursive agglomerative clustering, and summarized per
//! cluster. Candidate profiles are then scaled into the same space and
//! ranked against the cluster centroids by cosine distance.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! pathwise build --catalog careers.csv --mapping mapping.csv --out career_model.bin
//! pathwise match --model career_model.bin --text "expected salary: 1200000; creativity_score: 8"
//! pathwise serve --model career_model.bin --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use pathwise::prelude::*;
//!
//! let catalog = load_catalog_csv("careers.csv", &CatalogColumns::default()).unwrap();
//! let mapping = load_mapping_csv("mapping.csv").unwrap();
//! let model = ModelBuilder::new(BuildConfig::default()).build(catalog, mapping).unwrap();
//!
//! let mut profile = ExternalProfile::new();
//! profile.insert("expected_salary", 1_200_000.0);
//! profile.insert("creativity_score", 8.0);
//!
//! for m in model.match_profile(&profile, 3).unwrap() {
//!     println!("{} {:.3} {:?}", m.cluster_id, m.distance, m.summary.top_items);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `pathwise-schema` - field values, mapping table, profiles, free-text extraction
//! - `pathwise-core` - scaler, recursive splitter, metadata, matcher, model build
//! - `pathwise-storage` - CSV loaders, model artifacts, metadata export
//! - `pathwise-api` - REST inference endpoints

// Re-export core types
pub use pathwise_core::{
    BuildConfig, CareerModel, Catalog, ClusterMatch, ClusterMetadata, ClusterSet, Error, FeatureMatrix,
    FeatureSelector, ItemRecord, MatchContext, MetadataConfig, ModelBuilder, RecursiveSplitter, Result,
    ScalingModel, SplitConfig, SplitOutcome,
};

// Re-export schema
pub use pathwise_schema::{profile_from_free_text, CategoricalMapping, ExternalProfile, FieldMap, FieldValue};

// Re-export storage
pub use pathwise_storage::{
    export_metadata_json, load_catalog_csv, load_mapping_csv, load_profiles_csv, ArtifactStore, CatalogColumns,
};

// Re-export API
pub use pathwise_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        export_metadata_json, load_catalog_csv, load_mapping_csv, load_profiles_csv, profile_from_free_text,
        ArtifactStore, BuildConfig, CareerModel, Catalog, CatalogColumns, CategoricalMapping, ClusterMatch,
        Error, ExternalProfile, FieldMap, ItemRecord, ModelBuilder, RestApi, Result, SplitConfig,
    };
}
