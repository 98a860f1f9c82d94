use serde::{Deserialize, Serialize};

/// Added to the standard deviation in self-normalization so a constant
/// vector does not divide by zero.
pub const SELF_NORMALIZATION_EPSILON: f64 = 1e-9;

/// A dense vector of `f64` features
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f64>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Per-dimension arithmetic mean of a set of rows of equal length.
    ///
    /// Returns `None` for an empty set.
    pub fn mean_of(rows: &[&[f64]]) -> Option<Self> {
        let first = rows.first()?;
        let mut sum = vec![0.0; first.len()];
        for row in rows {
            for (acc, x) in sum.iter_mut().zip(row.iter()) {
                *acc += x;
            }
        }
        let n = rows.len() as f64;
        for x in &mut sum {
            *x /= n;
        }
        Some(Self { data: sum })
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn into_inner(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    pub fn dot(&self, other: &Vector) -> f64 {
        self.data.iter().zip(other.data.iter()).map(|(a, b)| a * b).sum()
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Compute cosine similarity with another vector.
    /// A zero-norm side has similarity 0.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f64 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        self.dot(other) / (norm_a * norm_b)
    }

    /// Cosine distance `1 - cos`, clamped to `[0, 2]`
    #[inline]
    pub fn cosine_distance(&self, other: &Vector) -> f64 {
        (1.0 - self.cosine_similarity(other)).clamp(0.0, 2.0)
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Population standard deviation of the components
    pub fn std_dev(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self.data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / self.data.len() as f64;
        var.sqrt()
    }

    /// Z-score the vector against its own mean and standard deviation.
    ///
    /// This is not the fitted catalog transform; results computed from it
    /// are only an approximation of the scaled space.
    #[must_use]
    pub fn self_normalized(&self) -> Self {
        let mean = self.mean();
        let denom = self.std_dev() + SELF_NORMALIZATION_EPSILON;
        Self {
            data: self.data.iter().map(|x| (x - mean) / denom).collect(),
        }
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

/// Euclidean distance between two equal-length slices
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let v1 = Vector::new(vec![1.0, 0.0]);
        let v2 = Vector::new(vec![1.0, 0.0]);
        assert!((v1.cosine_similarity(&v2) - 1.0).abs() < 1e-12);

        let v3 = Vector::new(vec![1.0, 0.0]);
        let v4 = Vector::new(vec![0.0, 1.0]);
        assert!(v3.cosine_similarity(&v4).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_distance() {
        let a = Vector::new(vec![1.0, 1.0]);
        let b = Vector::new(vec![-1.0, -1.0]);
        assert!((a.cosine_distance(&b) - 2.0).abs() < 1e-12);
        assert!(a.cosine_distance(&a).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_distance_is_one() {
        let zero = Vector::new(vec![0.0; 3]);
        let v = Vector::new(vec![0.5, -1.0, 2.0]);
        assert_eq!(zero.cosine_distance(&v), 1.0);
    }

    #[test]
    fn test_l2_distance() {
        assert!((euclidean(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-12);
        assert_eq!(euclidean(&[1.5, -2.0], &[1.5, -2.0]), 0.0);
    }

    #[test]
    fn test_mean_of() {
        let rows: Vec<&[f64]> = vec![&[1.0, 2.0], &[3.0, 4.0], &[5.0, 9.0]];
        let mean = Vector::mean_of(&rows).unwrap();
        assert_eq!(mean.as_slice(), &[3.0, 5.0]);
        assert!(Vector::mean_of(&[]).is_none());
    }

    #[test]
    fn test_self_normalized() {
        let v = Vector::new(vec![1.0, 2.0, 3.0]);
        let z = v.self_normalized();
        assert!(z.mean().abs() < 1e-9);
        assert!((z.std_dev() - 1.0).abs() < 1e-6);

        let constant = Vector::new(vec![4.0, 4.0]).self_normalized();
        assert_eq!(constant.as_slice(), &[0.0, 0.0]);
    }
}
