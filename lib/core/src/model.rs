//! Offline model build
//!
//! [`ModelBuilder::build`] runs the whole pipeline: mapping table, feature
//! selection, scaler fit, recursive split and metadata. The resulting
//! [`CareerModel`] is immutable and is what gets persisted and served.

use crate::catalog::{Catalog, FeatureSelector};
use crate::matcher::{ClusterMatch, MatchContext};
use crate::metadata::{build_cluster_metadata, ClusterMetadata, ClusterSet, MetadataConfig};
use crate::scaler::ScalingModel;
use crate::splitter::{RecursiveSplitter, SplitConfig};
use crate::Result;
use pathwise_schema::{CategoricalMapping, ExternalProfile, FieldMap, UNKNOWN_CATEGORY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub split: SplitConfig,
    pub metadata: MetadataConfig,
    /// Catalog feature / profile field pairs stored with the model
    pub field_map: FieldMap,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            split: SplitConfig {
                max_cluster_size: 25,
                ..SplitConfig::default()
            },
            metadata: MetadataConfig::default(),
            field_map: FieldMap::default(),
        }
    }
}

/// A built career model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerModel {
    pub scaling: ScalingModel,
    pub feature_columns: Vec<String>,
    /// Item id to leaf cluster label
    pub assignments: BTreeMap<u64, String>,
    pub clusters: ClusterSet,
    /// Catalog after the mapping table was applied
    pub catalog: Catalog,
    pub mappings: CategoricalMapping,
    pub field_map: FieldMap,
}

impl CareerModel {
    pub fn context(&self) -> MatchContext<'_> {
        MatchContext::new(&self.scaling, &self.feature_columns, &self.clusters, &self.field_map)
    }

    #[inline]
    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    pub fn cluster(&self, cluster_id: &str) -> Option<&ClusterMetadata> {
        self.clusters.get(cluster_id)
    }

    /// Encode a profile's categorical fields with the model's mapping table.
    pub fn prepare_profile(&self, profile: &ExternalProfile) -> ExternalProfile {
        if self.mappings.is_empty() {
            return profile.clone();
        }
        self.mappings.apply_to_profile(profile, UNKNOWN_CATEGORY)
    }

    /// Encode and match a profile.
    pub fn match_profile(&self, profile: &ExternalProfile, top_k: usize) -> Result<Vec<ClusterMatch>> {
        self.context().match_profile(&self.prepare_profile(profile), top_k)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    config: BuildConfig,
    selector: FeatureSelector,
}

impl ModelBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            selector: FeatureSelector::default(),
        }
    }

    /// Use a custom feature selector.
    pub fn with_selector(mut self, selector: FeatureSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn build(&self, mut catalog: Catalog, mappings: CategoricalMapping) -> Result<CareerModel> {
        self.config.split.validate()?;

        let mapped = catalog.apply_mapping(&mappings);
        tracing::info!(items = catalog.len(), mapped_columns = mapped, "building career model");

        let raw = self.selector.select(&catalog)?;
        let scaling = ScalingModel::fit(&raw)?;
        let scaled = scaling.transform_matrix(&raw)?;

        let outcome = RecursiveSplitter::new(self.config.split.clone()).split(&scaled)?;
        let clusters = build_cluster_metadata(&outcome.assignments, &scaled, &catalog, &self.config.metadata)?;

        tracing::info!(
            features = scaling.dim(),
            clusters = clusters.len(),
            "career model built"
        );

        Ok(CareerModel {
            feature_columns: scaling.columns().to_vec(),
            scaling,
            assignments: outcome.assignments,
            clusters,
            catalog,
            mappings,
            field_map: self.config.field_map.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemRecord;
    use crate::Error;
    use pathwise_schema::MappingRow;

    fn catalog() -> Catalog {
        let mut records = Vec::new();
        for i in 0..12u64 {
            let high = i % 2 == 0;
            let jitter = i as f64 * 0.01;
            records.push(
                ItemRecord::new(i, format!("Job {i}"), if high { "Technology" } else { "Arts" })
                    .with_attribute("salary_inr_avg", (if high { 1_800_000.0 } else { 300_000.0 }) + jitter * 1000.0)
                    .with_attribute("creativity_requirement", (if high { 2.0 } else { 9.0 }) + jitter)
                    .with_attribute("teamwork_requirement", (if high { 8.0 } else { 3.0 }) - jitter)
                    .with_attribute("sector", if high { "Private" } else { "Public" }),
            );
        }
        Catalog::from_records(records).unwrap()
    }

    fn config(max_cluster_size: usize) -> BuildConfig {
        BuildConfig {
            split: SplitConfig {
                max_cluster_size,
                ..SplitConfig::default()
            },
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_build_separates_groups() {
        let model = ModelBuilder::new(config(6)).build(catalog(), CategoricalMapping::new()).unwrap();

        assert_eq!(
            model.feature_columns,
            vec!["creativity_requirement", "teamwork_requirement", "salary_inr_avg"]
        );
        assert_eq!(model.n_clusters(), 2);
        assert_eq!(model.assignments.len(), 12);
        for cluster in &model.clusters {
            assert_eq!(cluster.size, 6);
            assert_eq!(cluster.category_histogram.len(), 1);
        }
        assert_ne!(model.assignments[&0], model.assignments[&1]);
    }

    #[test]
    fn test_build_applies_mapping() {
        let mappings = CategoricalMapping::from_rows(vec![MappingRow::new("sector", "Public", "1")]);
        let model = ModelBuilder::new(config(25)).build(catalog(), mappings).unwrap();
        assert_eq!(model.catalog.get(1).unwrap().number("sector"), Some(1.0));
        assert_eq!(model.catalog.get(0).unwrap().number("sector"), Some(-1.0));
        assert_eq!(model.n_clusters(), 1);
    }

    #[test]
    fn test_match_prefers_similar_cluster() {
        let model = ModelBuilder::new(config(6)).build(catalog(), CategoricalMapping::new()).unwrap();

        let mut profile = ExternalProfile::new();
        profile.insert("expected_salary", 1_800_000.0);
        profile.insert("creativity_score", 2.0);
        profile.insert("teamwork_score", 8.0);
        let matches = model.match_profile(&profile, 2).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].cluster_id, model.assignments[&0]);
        assert!(matches[0].distance <= matches[1].distance);
    }

    #[test]
    fn test_empty_catalog() {
        let err = ModelBuilder::default()
            .build(Catalog::new(vec!["salary_inr_avg".to_string()]), CategoricalMapping::new())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyCatalog));
    }

    #[test]
    fn test_default_config() {
        let config = BuildConfig::default();
        assert_eq!(config.split.max_cluster_size, 25);
        assert_eq!(config.metadata.top_k, 5);
        assert_eq!(config.field_map.len(), 6);
    }
}
