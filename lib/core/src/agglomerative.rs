//! Binary agglomerative clustering
//!
//! Builds the dendrogram of a set of rows with `kodama` (Ward on Euclidean
//! distances by default) and cuts it at the last merge. The group holding
//! the first row is labelled `0`.

use crate::vector::euclidean;
use crate::{Error, Result};
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};
use serde::{Deserialize, Serialize};

/// Splits a set of rows into two groups.
///
/// Implementations must be deterministic for identical input.
pub trait BinarySplitter {
    /// Return one label in `{0, 1}` per row.
    fn split_in_two(&self, rows: &[&[f64]]) -> Result<Vec<usize>>;
}

/// Linkage method for agglomerative clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Linkage {
    Single,
    Complete,
    Average,
    #[default]
    Ward,
}

/// Agglomerative clustering cut into two groups.
#[derive(Debug, Clone, Default)]
pub struct Agglomerative {
    linkage: Linkage,
}

impl Agglomerative {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    fn kodama_method(&self) -> KodamaMethod {
        match self.linkage {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        }
    }
}

impl BinarySplitter for Agglomerative {
    fn split_in_two(&self, rows: &[&[f64]]) -> Result<Vec<usize>> {
        let n = rows.len();
        if n < 2 {
            return Err(Error::Clustering(format!("cannot split {n} row(s) in two")));
        }
        let d = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != d) {
            return Err(Error::DimensionMismatch {
                expected: d,
                actual: bad.len(),
            });
        }

        // Condensed dissimilarity matrix: upper triangle, row-major, n choose 2.
        let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n - 1 {
            for j in i + 1..n {
                condensed.push(euclidean(rows[i], rows[j]));
            }
        }

        // Leaves are 0..n-1 and merge i creates cluster n + i. Replaying all
        // but the final merge leaves exactly two roots.
        let dendrogram = kodama_linkage(&mut condensed, n, self.kodama_method());
        let mut parent: Vec<Option<usize>> = vec![None; 2 * n - 1];
        for (i, step) in dendrogram.steps().iter().take(n - 2).enumerate() {
            parent[step.cluster1] = Some(n + i);
            parent[step.cluster2] = Some(n + i);
        }

        let root = |mut node: usize| {
            while let Some(p) = parent[node] {
                node = p;
            }
            node
        };

        let first_root = root(0);
        Ok((0..n).map(|leaf| usize::from(root(leaf) != first_root)).collect())
    }
}
