// JSON export of cluster metadata
use anyhow::{Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use pathwise_core::{CareerModel, ClusterSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Exported summary of one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterExport {
    pub centroid: BTreeMap<String, f64>,
    pub size: usize,
    pub top_jobs: Vec<String>,
    pub primary_categories: BTreeMap<String, usize>,
}

/// `cluster label -> summary` document
pub fn metadata_document(clusters: &ClusterSet) -> BTreeMap<String, ClusterExport> {
    clusters
        .iter()
        .map(|cluster| {
            let export = ClusterExport {
                centroid: clusters.centroid_map(cluster),
                size: cluster.size,
                top_jobs: cluster.top_items.clone(),
                primary_categories: cluster.category_histogram.clone(),
            };
            (cluster.cluster_id.clone(), export)
        })
        .collect()
}

/// Write the metadata document of a model as pretty-printed JSON.
pub fn export_metadata_json<P: AsRef<Path>>(path: P, model: &CareerModel) -> Result<()> {
    let path = path.as_ref();
    let document = metadata_document(&model.clusters);
    let json = serde_json::to_vec_pretty(&document)?;

    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(&json))
        .with_context(|| format!("Failed to write metadata export {:?}", path))?;
    tracing::info!(path = ?path, clusters = document.len(), "exported cluster metadata");
    Ok(())
}
