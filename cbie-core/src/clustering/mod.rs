//! # Clustering Engine (C3)
//!
//! Groups observation embeddings into behavior clusters by density,
//! leaving sparse points labeled as noise (spec.md §4.3).

pub mod algorithm;
pub mod types;

pub use algorithm::cluster;
pub(crate) use algorithm::cosine_distance;
pub use types::{ClusteringOutput, RawCluster, NOISE_LABEL};
