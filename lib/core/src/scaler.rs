//! Column-wise standardization
//!
//! [`ScalingModel::fit`] learns a `(mean, scale)` pair per feature column
//! after imputing missing cells with the column median. The fitted model owns
//! the authoritative column order; every vector presented to
//! [`ScalingModel::transform`] must follow it exactly.

use crate::matrix::FeatureMatrix;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Standard deviations below this are treated as zero variance.
const ZERO_VARIANCE: f64 = 10.0 * f64::EPSILON;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingModel {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
    medians: Vec<f64>,
}

impl ScalingModel {
    /// Fit on every row of `matrix`.
    ///
    /// `NaN` cells are replaced by the column median before the mean and the
    /// population standard deviation are computed. A zero-variance column
    /// gets scale `1.0`. A column with no observed value imputes `0.0`.
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self> {
        if matrix.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        if matrix.n_cols() == 0 {
            return Err(Error::NoFeatureColumns);
        }

        let n = matrix.n_rows() as f64;
        let mut means = Vec::with_capacity(matrix.n_cols());
        let mut scales = Vec::with_capacity(matrix.n_cols());
        let mut medians = Vec::with_capacity(matrix.n_cols());

        for (j, name) in matrix.columns().iter().enumerate() {
            let observed: Vec<f64> = matrix.column_values(j).filter(|x| x.is_finite()).collect();
            let median = match median(observed) {
                Some(m) => m,
                None => {
                    tracing::warn!(column = %name, "feature column has no observed values; imputing 0");
                    0.0
                }
            };

            let imputed = move || matrix.column_values(j).map(move |x| if x.is_finite() { x } else { median });
            let mean = imputed().sum::<f64>() / n;
            let var = imputed().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();

            means.push(mean);
            scales.push(if std < ZERO_VARIANCE { 1.0 } else { std });
            medians.push(median);
        }

        Ok(Self {
            columns: matrix.columns().to_vec(),
            means,
            scales,
            medians,
        })
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    #[inline]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    #[inline]
    pub fn medians(&self) -> &[f64] {
        &self.medians
    }

    /// Apply `(x - mean) / scale` per column.
    ///
    /// Fails fast when `values` does not have exactly one entry per fitted
    /// column. `NaN` inputs pass through as `NaN`.
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                actual: values.len(),
            });
        }
        Ok(values
            .iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    /// [`transform`](Self::transform) with an explicit column list that must
    /// equal the fitted columns in count and order.
    pub fn transform_aligned(&self, columns: &[String], values: &[f64]) -> Result<Vec<f64>> {
        if columns != self.columns.as_slice() {
            return Err(Error::ColumnOrderMismatch {
                expected: self.columns.join(", "),
                actual: columns.join(", "),
            });
        }
        self.transform(values)
    }

    /// Impute and scale every row of a raw matrix laid out in the fitted
    /// column order.
    pub fn transform_matrix(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        if matrix.columns() != self.columns.as_slice() {
            return Err(Error::ColumnOrderMismatch {
                expected: self.columns.join(", "),
                actual: matrix.columns().join(", "),
            });
        }
        Ok(matrix.map_rows(|row| {
            row.iter()
                .enumerate()
                .map(|(j, &x)| {
                    let x = if x.is_finite() { x } else { self.medians[j] };
                    (x - self.means[j]) / self.scales[j]
                })
                .collect()
        }))
    }
}

/// Median of the values; the mean of the two middle values for even counts.
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
