//! Recursive cluster splitting
//!
//! Halves any cluster larger than [`SplitConfig::max_cluster_size`] while the
//! split's silhouette clears [`SplitConfig::min_improvement`]. Nodes are
//! visited through a FIFO worklist; a rejected node is never revisited.

use crate::agglomerative::{Agglomerative, BinarySplitter};
use crate::matrix::FeatureMatrix;
use crate::silhouette::silhouette_score;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Clusters with fewer members are never split.
pub const MIN_SPLITTABLE_SIZE: usize = 4;

/// Score assigned to a split whose silhouette is undefined.
pub const WORST_SILHOUETTE: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Clusters above this size are candidates for splitting
    pub max_cluster_size: usize,
    /// Silhouette margin a split must exceed
    pub min_improvement: f64,
    /// Label of the initial cluster
    pub root_label: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_cluster_size: 50,
            min_improvement: 0.05,
            root_label: "C0".to_string(),
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_cluster_size == 0 {
            return Err(Error::InvalidConfig("max_cluster_size must be at least 1".to_string()));
        }
        if !self.min_improvement.is_finite() {
            return Err(Error::InvalidConfig("min_improvement must be finite".to_string()));
        }
        if self.root_label.is_empty() {
            return Err(Error::InvalidConfig("root_label must not be empty".to_string()));
        }
        Ok(())
    }
}

/// One cluster in the split history.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterNode {
    pub label: String,
    /// Row positions into the scaled matrix
    pub members: Vec<usize>,
    /// Arena indices of the two halves once split
    pub children: Option<[usize; 2]>,
}

impl ClusterNode {
    fn new(label: String, members: Vec<usize>) -> Self {
        Self {
            label,
            members,
            children: None,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Result of a [`RecursiveSplitter::split`] run.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// Every item id mapped to its leaf label
    pub assignments: BTreeMap<u64, String>,
    /// Every node ever created, root first
    pub nodes: Vec<ClusterNode>,
    /// Split attempts that ran the binary clustering
    pub attempts: usize,
    pub accepted: usize,
}

impl SplitOutcome {
    /// Leaf nodes in creation order.
    pub fn leaves(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    pub fn leaf_labels(&self) -> Vec<&str> {
        self.leaves().map(|n| n.label.as_str()).collect()
    }

    pub fn n_clusters(&self) -> usize {
        self.leaves().count()
    }

    /// `label -> member ids`, members in ascending id order.
    pub fn clusters(&self) -> BTreeMap<&str, Vec<u64>> {
        let mut clusters: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
        for (id, label) in &self.assignments {
            clusters.entry(label.as_str()).or_default().push(*id);
        }
        clusters
    }

    pub fn label_of(&self, id: u64) -> Option<&str> {
        self.assignments.get(&id).map(String::as_str)
    }
}

/// Recursive binary splitter over a scaled feature matrix.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter<S = Agglomerative> {
    config: SplitConfig,
    splitter: S,
}

impl RecursiveSplitter<Agglomerative> {
    pub fn new(config: SplitConfig) -> Self {
        Self {
            config,
            splitter: Agglomerative::new(),
        }
    }
}

impl<S: BinarySplitter> RecursiveSplitter<S> {
    /// Use a different binary split routine.
    pub fn with_splitter(config: SplitConfig, splitter: S) -> Self {
        Self { config, splitter }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn split(&self, matrix: &FeatureMatrix) -> Result<SplitOutcome> {
        self.config.validate()?;
        if matrix.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let root = ClusterNode::new(self.config.root_label.clone(), (0..matrix.n_rows()).collect());
        let mut nodes = vec![root];
        let mut worklist = VecDeque::from([0usize]);
        let mut attempts = 0;
        let mut accepted = 0;

        while let Some(index) = worklist.pop_front() {
            let node = &nodes[index];
            if node.size() <= self.config.max_cluster_size {
                continue;
            }
            if node.size() < MIN_SPLITTABLE_SIZE {
                tracing::debug!(label = %node.label, size = node.size(), "cluster too small to split");
                continue;
            }

            attempts += 1;
            let Some(halves) = self.try_split(matrix, node) else {
                continue;
            };

            let [left, right] = halves;
            let base = nodes.len();
            let label = nodes[index].label.clone();
            nodes[index].children = Some([base, base + 1]);
            nodes.push(ClusterNode::new(format!("{label}.0"), left));
            nodes.push(ClusterNode::new(format!("{label}.1"), right));
            worklist.push_back(base);
            worklist.push_back(base + 1);
            accepted += 1;
        }

        let mut assignments = BTreeMap::new();
        for node in nodes.iter().filter(|n| n.is_leaf()) {
            for &position in &node.members {
                assignments.insert(matrix.item_ids()[position], node.label.clone());
            }
        }

        tracing::info!(
            items = matrix.n_rows(),
            clusters = nodes.iter().filter(|n| n.is_leaf()).count(),
            attempts,
            accepted,
            "recursive split finished"
        );

        Ok(SplitOutcome {
            assignments,
            nodes,
            attempts,
            accepted,
        })
    }

    /// Split a node in two and return the halves if the split is accepted.
    fn try_split(&self, matrix: &FeatureMatrix, node: &ClusterNode) -> Option<[Vec<usize>; 2]> {
        let rows = matrix.select_rows(&node.members);
        let labels = match self.splitter.split_in_two(&rows) {
            Ok(labels) => labels,
            Err(e) => {
                tracing::warn!(label = %node.label, error = %e, "binary split failed");
                return None;
            }
        };

        let score = silhouette_score(&rows, &labels).unwrap_or(WORST_SILHOUETTE);
        let accept = score > self.config.min_improvement && score > 0.0;
        tracing::debug!(label = %node.label, size = node.size(), score, accept, "split attempt");
        if !accept {
            return None;
        }

        let mut halves = [Vec::new(), Vec::new()];
        for (&position, &side) in node.members.iter().zip(labels.iter()) {
            halves[side.min(1)].push(position);
        }
        Some(halves)
    }
}
