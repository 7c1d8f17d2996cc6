//! Clustering inputs and outputs (spec.md §4.3).

/// Sentinel label for points the clustering pass could not assign to
/// any cluster.
pub const NOISE_LABEL: i64 = -1;

/// One raw cluster as produced by the clustering pass, before
/// aggregation turns it into a [`crate::types::Cluster`].
#[derive(Debug, Clone)]
pub struct RawCluster {
    /// Dense cluster id, `0..clusters.len()`.
    pub id: usize,
    /// Indices into the input slice that belong to this cluster.
    pub member_indices: Vec<usize>,
    /// Mean of member embeddings, re-normalized to unit length.
    pub centroid: Vec<f32>,
    /// Mean cosine distance of members to the centroid.
    pub intra_distance_mean: f64,
    /// Standard deviation of member-to-centroid cosine distance.
    pub intra_distance_std: f64,
    /// Maximum member-to-centroid cosine distance.
    pub intra_distance_max: f64,
}

/// Per-point outcome of a clustering pass, parallel to the input slice.
#[derive(Debug, Clone)]
pub struct ClusteringOutput {
    /// `labels[i]` is the cluster id for input point `i`, or
    /// [`NOISE_LABEL`].
    pub labels: Vec<i64>,
    /// `probabilities[i]` is a confidence-of-membership in `[0, 1]`
    /// for input point `i`; `0.0` for noise.
    pub probabilities: Vec<f64>,
    /// The clusters found, dense-indexed and disjoint from noise.
    pub clusters: Vec<RawCluster>,
}
