//! Per-cluster summaries
//!
//! Built once from the final label assignment and consumed read-only by the
//! matcher and the export/serving layers.

use crate::catalog::{Catalog, ItemRecord};
use crate::matrix::FeatureMatrix;
use crate::vector::Vector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Numeric attribute used to pick the top items
    pub rank_by: String,
    pub top_k: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            rank_by: "salary_inr_avg".to_string(),
            top_k: 5,
        }
    }
}

/// Summary of one leaf cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    pub cluster_id: String,
    /// Mean scaled vector of the members, in the set's column order
    pub centroid: Vec<f64>,
    pub size: usize,
    /// Display names of the highest ranked members
    pub top_items: Vec<String>,
    pub category_histogram: BTreeMap<String, usize>,
}

/// Metadata for every leaf cluster, ordered by label.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterSet {
    columns: Vec<String>,
    clusters: Vec<ClusterMetadata>,
}

impl ClusterSet {
    /// Assemble a set from prebuilt summaries, sorting them by label.
    pub fn new(columns: Vec<String>, mut clusters: Vec<ClusterMetadata>) -> Result<Self> {
        if let Some(bad) = clusters.iter().find(|c| c.centroid.len() != columns.len()) {
            return Err(Error::DimensionMismatch {
                expected: columns.len(),
                actual: bad.centroid.len(),
            });
        }
        clusters.sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));
        Ok(Self { columns, clusters })
    }

    /// Feature columns the centroids are laid out in
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClusterMetadata> {
        self.clusters.iter()
    }

    pub fn get(&self, cluster_id: &str) -> Option<&ClusterMetadata> {
        self.clusters
            .binary_search_by(|c| c.cluster_id.as_str().cmp(cluster_id))
            .ok()
            .map(|i| &self.clusters[i])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.clusters.iter().map(|c| c.cluster_id.as_str())
    }

    /// Centroid component for a named feature.
    pub fn centroid_value(&self, cluster: &ClusterMetadata, feature: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == feature)
            .and_then(|j| cluster.centroid.get(j).copied())
    }

    /// Centroid of a cluster as `feature -> value`.
    pub fn centroid_map(&self, cluster: &ClusterMetadata) -> BTreeMap<String, f64> {
        self.columns
            .iter()
            .cloned()
            .zip(cluster.centroid.iter().copied())
            .collect()
    }
}

impl<'a> IntoIterator for &'a ClusterSet {
    type Item = &'a ClusterMetadata;
    type IntoIter = std::slice::Iter<'a, ClusterMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// Summarize every cluster of a label assignment.
///
/// `scaled` supplies the centroid space; `catalog` supplies display names,
/// categories and the ranking attribute. Members are visited in catalog
/// order, which also breaks ranking ties.
pub fn build_cluster_metadata(
    assignments: &BTreeMap<u64, String>,
    scaled: &FeatureMatrix,
    catalog: &Catalog,
    config: &MetadataConfig,
) -> Result<ClusterSet> {
    let mut members: BTreeMap<&str, Vec<&ItemRecord>> = BTreeMap::new();
    for item in catalog.items() {
        if let Some(label) = assignments.get(&item.id) {
            members.entry(label.as_str()).or_default().push(item);
        }
    }
    if let Some(&id) = assignments.keys().find(|id| catalog.get(**id).is_none()) {
        return Err(Error::UnknownItem(id));
    }

    let mut clusters = Vec::with_capacity(members.len());
    for (label, items) in members {
        let rows = items
            .iter()
            .map(|item| scaled.row_by_id(item.id).ok_or(Error::UnknownItem(item.id)))
            .collect::<Result<Vec<&[f64]>>>()?;
        let centroid = Vector::mean_of(&rows)
            .map(Vector::into_inner)
            .unwrap_or_else(|| vec![0.0; scaled.n_cols()]);

        let mut ranked: Vec<(&ItemRecord, f64)> = items
            .iter()
            .map(|item| (*item, item.number(&config.rank_by).unwrap_or(f64::NAN)))
            .collect();
        ranked.sort_by(|a, b| descending_nan_last(a.1, b.1));
        let top_items = ranked
            .iter()
            .take(config.top_k)
            .map(|(item, _)| item.title.clone())
            .collect();

        let mut category_histogram = BTreeMap::new();
        for item in items.iter().filter(|item| !item.category.is_empty()) {
            *category_histogram.entry(item.category.clone()).or_insert(0) += 1;
        }

        clusters.push(ClusterMetadata {
            cluster_id: label.to_string(),
            centroid,
            size: items.len(),
            top_items,
            category_histogram,
        });
    }

    tracing::debug!(clusters = clusters.len(), "built cluster metadata");
    Ok(ClusterSet {
        columns: scaled.columns().to_vec(),
        clusters,
    })
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            ItemRecord::new(0, "Analyst", "Finance").with_attribute("salary_inr_avg", 900_000.0),
            ItemRecord::new(1, "Clerk", "Finance").with_attribute("salary_inr_avg", 300_000.0),
            ItemRecord::new(2, "Painter", "Arts"),
            ItemRecord::new(3, "Engineer", "Technology").with_attribute("salary_inr_avg", 1_500_000.0),
            ItemRecord::new(4, "Auditor", "").with_attribute("salary_inr_avg", 900_000.0),
        ])
        .unwrap()
    }

    fn scaled() -> FeatureMatrix {
        FeatureMatrix::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![
                (0, vec![1.0, 2.0]),
                (1, vec![3.0, -2.0]),
                (2, vec![-1.0, 3.0]),
                (3, vec![0.0, 0.0]),
                (4, vec![4.0, 4.0]),
            ],
        )
        .unwrap()
    }

    fn assignments() -> BTreeMap<u64, String> {
        [(0, "C0.1"), (1, "C0.1"), (2, "C0.1"), (3, "C0.0"), (4, "C0.0")]
            .into_iter()
            .map(|(id, l)| (id, l.to_string()))
            .collect()
    }

    #[test]
    fn test_centroid_is_member_mean() {
        let set = build_cluster_metadata(&assignments(), &scaled(), &catalog(), &MetadataConfig::default()).unwrap();
        let cluster = set.get("C0.1").unwrap();
        assert_eq!(cluster.size, 3);
        assert!((cluster.centroid[0] - 1.0).abs() < 1e-12);
        assert!((cluster.centroid[1] - 1.0).abs() < 1e-12);
        assert_eq!(set.centroid_value(cluster, "b"), Some(cluster.centroid[1]));
        assert_eq!(set.centroid_value(cluster, "missing"), None);
    }

    #[test]
    fn test_ordered_by_label() {
        let set = build_cluster_metadata(&assignments(), &scaled(), &catalog(), &MetadataConfig::default()).unwrap();
        assert_eq!(set.labels().collect::<Vec<_>>(), vec!["C0.0", "C0.1"]);
    }

    #[test]
    fn test_top_items_rank_descending_missing_last() {
        let config = MetadataConfig {
            top_k: 2,
            ..MetadataConfig::default()
        };
        let set = build_cluster_metadata(&assignments(), &scaled(), &catalog(), &config).unwrap();
        assert_eq!(set.get("C0.1").unwrap().top_items, vec!["Analyst", "Clerk"]);
        assert_eq!(set.get("C0.0").unwrap().top_items, vec!["Engineer", "Auditor"]);

        let all = build_cluster_metadata(&assignments(), &scaled(), &catalog(), &MetadataConfig::default()).unwrap();
        assert_eq!(all.get("C0.1").unwrap().top_items, vec!["Analyst", "Clerk", "Painter"]);
    }

    #[test]
    fn test_histogram_skips_empty_category() {
        let set = build_cluster_metadata(&assignments(), &scaled(), &catalog(), &MetadataConfig::default()).unwrap();
        let c01 = set.get("C0.1").unwrap();
        assert_eq!(c01.category_histogram.get("Finance"), Some(&2));
        assert_eq!(c01.category_histogram.get("Arts"), Some(&1));
        assert_eq!(c01.category_histogram.len(), 2);
        let c00 = set.get("C0.0").unwrap();
        assert_eq!(c00.category_histogram.len(), 1);
    }

    #[test]
    fn test_unknown_item_fails() {
        let mut labels = assignments();
        labels.insert(99, "C0.0".to_string());
        let err = build_cluster_metadata(&labels, &scaled(), &catalog(), &MetadataConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownItem(99)));
    }

    #[test]
    fn test_centroid_map() {
        let set = build_cluster_metadata(&assignments(), &scaled(), &catalog(), &MetadataConfig::default()).unwrap();
        let map = set.centroid_map(set.get("C0.0").unwrap());
        assert_eq!(map.get("a"), Some(&2.0));
        assert_eq!(map.get("b"), Some(&2.0));
    }
}
