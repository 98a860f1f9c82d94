//! Silhouette coefficient
//!
//! Mean over rows of `(b - a) / max(a, b)` with Euclidean distances, where
//! `a` is the mean distance within the row's cluster and `b` the smallest
//! mean distance to another cluster. Singleton rows score `0`.

use crate::vector::euclidean;
use std::collections::BTreeMap;

/// Silhouette coefficient of a labelling, or `None` when it is undefined:
/// mismatched lengths, fewer than two distinct labels, or as many labels as
/// rows.
pub fn silhouette_score(rows: &[&[f64]], labels: &[usize]) -> Option<f64> {
    let n = rows.len();
    if n == 0 || labels.len() != n {
        return None;
    }

    // label -> dense index
    let mut label_index: BTreeMap<usize, usize> = BTreeMap::new();
    for &l in labels {
        let next = label_index.len();
        label_index.entry(l).or_insert(next);
    }
    let k = label_index.len();
    if k < 2 || k >= n {
        return None;
    }

    let dense: Vec<usize> = labels.iter().map(|l| label_index[l]).collect();
    let mut sizes = vec![0usize; k];
    for &c in &dense {
        sizes[c] += 1;
    }

    let mut total = 0.0;
    let mut sums = vec![0.0f64; k];
    for i in 0..n {
        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in 0..n {
            if i != j {
                sums[dense[j]] += euclidean(rows[i], rows[j]);
            }
        }

        let own = dense[i];
        if sizes[own] <= 1 {
            continue;
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Some(total / n as f64)
}
