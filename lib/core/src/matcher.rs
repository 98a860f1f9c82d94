//! Nearest-centroid profile matching
//!
//! A [`MatchContext`] borrows the fitted scaler, the feature column order and
//! the cluster summaries of a built model. It holds no mutable state, so one
//! context can serve any number of concurrent match calls.

use crate::metadata::{ClusterMetadata, ClusterSet};
use crate::scaler::ScalingModel;
use crate::vector::Vector;
use crate::{Error, Result};
use ordered_float::OrderedFloat;
use pathwise_schema::{ExternalProfile, FieldMap};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One ranked cluster for a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMatch {
    pub cluster_id: String,
    /// Cosine distance between profile and centroid, in `[0, 2]`
    pub distance: f64,
    /// Set when the profile could not go through the fitted scaler and was
    /// normalized against itself instead; distances are then approximate.
    pub degraded: bool,
    pub summary: ClusterMetadata,
}

/// A profile vector ready for comparison against centroids.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileVector {
    pub values: Vector,
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub scaling: &'a ScalingModel,
    /// Feature order used at fit time
    pub feature_columns: &'a [String],
    pub clusters: &'a ClusterSet,
    pub field_map: &'a FieldMap,
}

impl<'a> MatchContext<'a> {
    pub fn new(
        scaling: &'a ScalingModel,
        feature_columns: &'a [String],
        clusters: &'a ClusterSet,
        field_map: &'a FieldMap,
    ) -> Self {
        Self {
            scaling,
            feature_columns,
            clusters,
            field_map,
        }
    }

    /// Raw profile values in feature column order.
    ///
    /// A feature reads the profile field paired with it in the field map.
    /// Unpaired features and missing, non-numeric or non-finite values
    /// read as `0.0`.
    pub fn raw_vector(&self, profile: &ExternalProfile) -> Vec<f64> {
        self.feature_columns
            .iter()
            .map(|feature| {
                self.field_map
                    .profile_field(feature)
                    .and_then(|field| profile.number(field))
                    .filter(|x| x.is_finite())
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Scale a profile into centroid space, falling back to
    /// self-normalization when the fitted transform rejects it.
    pub fn profile_vector(&self, profile: &ExternalProfile) -> ProfileVector {
        let raw = self.raw_vector(profile);
        match self.scaling.transform_aligned(self.feature_columns, &raw) {
            Ok(scaled) => ProfileVector {
                values: Vector::new(scaled),
                degraded: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, "scaler rejected profile; using self-normalized vector");
                ProfileVector {
                    values: Vector::new(raw).self_normalized(),
                    degraded: true,
                }
            }
        }
    }

    fn centroid(&self, cluster: &ClusterMetadata) -> Vector {
        Vector::new(
            self.feature_columns
                .iter()
                .map(|feature| self.clusters.centroid_value(cluster, feature).unwrap_or(0.0))
                .collect(),
        )
    }

    /// The `top_k` clusters closest to the profile, nearest first.
    ///
    /// Equal distances keep cluster label order. Asking for more clusters
    /// than exist is an error.
    pub fn match_profile(&self, profile: &ExternalProfile, top_k: usize) -> Result<Vec<ClusterMatch>> {
        let available = self.clusters.len();
        if top_k > available {
            return Err(Error::TooManyMatches {
                requested: top_k,
                available,
            });
        }

        let profile = self.profile_vector(profile);
        let mut ranked: Vec<(&ClusterMetadata, f64)> = self
            .clusters
            .iter()
            .map(|cluster| (cluster, profile.values.cosine_distance(&self.centroid(cluster))))
            .collect();
        ranked.sort_by_key(|(_, distance)| OrderedFloat(*distance));

        Ok(ranked
            .into_iter()
            .take(top_k)
            .map(|(cluster, distance)| ClusterMatch {
                cluster_id: cluster.cluster_id.clone(),
                distance,
                degraded: profile.degraded,
                summary: cluster.clone(),
            })
            .collect())
    }

    /// Match a batch of independent profiles in parallel.
    pub fn match_many(&self, profiles: &[ExternalProfile], top_k: usize) -> Vec<Result<Vec<ClusterMatch>>> {
        profiles
            .par_iter()
            .map(|profile| self.match_profile(profile, top_k))
            .collect()
    }
}
