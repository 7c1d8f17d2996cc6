//! Density-based clustering over cosine-normalized embeddings
//! (spec.md §4.3). The member-finding/expansion core is grounded on
//! the teacher's Euclidean DBSCAN (`patterns::dbscan::algorithms`),
//! adapted to a cosine metric and `min_samples=1` so that a single
//! strong neighbor relationship is enough to seed a cluster, matching
//! the hierarchical/"HDBSCAN-equivalent" behavior called for in the
//! spec without depending on an external HDBSCAN crate.

use crate::clustering::types::{ClusteringOutput, RawCluster, NOISE_LABEL};
use crate::config::EngineConfig;

/// Cosine distance between two unit vectors, `1 - dot(a, b)`.
///
/// Embeddings reaching this function are expected to already be
/// L2-normalized by [`crate::embeddings::gateway::EmbeddingGateway`];
/// if a caller passes un-normalized vectors, distances are still
/// well-defined but no longer bounded to `[0, 2]`.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    (1.0 - f64::from(dot)).max(0.0)
}

fn region_query(eps: f64, i: usize, embeddings: &[Vec<f32>]) -> Vec<usize> {
    embeddings
        .iter()
        .enumerate()
        .filter(|&(j, other)| j != i && cosine_distance(&embeddings[i], other) <= eps)
        .map(|(j, _)| j)
        .collect()
}

fn expand_cluster(
    config: &EngineConfig,
    seed: usize,
    neighbors: &[usize],
    cluster_id: i64,
    embeddings: &[Vec<f32>],
    labels: &mut [i64],
) {
    let mut queue: Vec<usize> = neighbors.to_vec();
    labels[seed] = cluster_id;
    let mut queued_at = 0;

    while queued_at < queue.len() {
        let p = queue[queued_at];
        queued_at += 1;

        if labels[p] != NOISE_LABEL - 1 {
            continue;
        }
        labels[p] = cluster_id;

        let p_neighbors = region_query(config.cluster_selection_epsilon, p, embeddings);
        if p_neighbors.len() + 1 >= config.min_samples {
            for n in p_neighbors {
                if labels[n] == NOISE_LABEL - 1 && !queue[queued_at..].contains(&n) {
                    queue.push(n);
                }
            }
        }
    }
}

/// Cluster `embeddings` using `config`'s density parameters.
///
/// Deterministic given a fixed input order: points are visited in
/// index order and neighbor lists preserve that order, so the same
/// input always yields the same labels and dense cluster ids.
///
/// Every point appears exactly once across `clusters`: points the
/// density algorithm labels noise (`labels[i] == -1`) are promoted to
/// their own degenerate one-point cluster (spec.md §4.3's "every input
/// point appears exactly once in the output... no point is silently
/// discarded"), which downstream tiering then forces to NOISE by its
/// `cluster_size == 1` rule. `probabilities` is unaffected by this
/// promotion — noise points keep membership probability `0`.
#[must_use]
pub fn cluster(embeddings: &[Vec<f32>], config: &EngineConfig) -> ClusteringOutput {
    let n = embeddings.len();
    const UNVISITED: i64 = NOISE_LABEL - 1;
    let mut labels: Vec<i64> = vec![UNVISITED; n];
    let mut next_cluster_id: i64 = 0;

    for i in 0..n {
        if labels[i] != UNVISITED {
            continue;
        }

        let neighbors = region_query(config.cluster_selection_epsilon, i, embeddings);
        if neighbors.len() + 1 < config.min_samples {
            labels[i] = NOISE_LABEL;
            continue;
        }

        expand_cluster(config, i, &neighbors, next_cluster_id, embeddings, &mut labels);
        next_cluster_id += 1;
    }

    // Points that were provisionally marked noise by an earlier seed
    // but later fell within another cluster's expansion already carry
    // that cluster's id; anything still UNVISITED here is a point with
    // zero neighbors of its own whose only neighbor relation was
    // one-directional due to floating point asymmetry — treat as noise.
    for label in &mut labels {
        if *label == UNVISITED {
            *label = NOISE_LABEL;
        }
    }

    enforce_min_cluster_size(&mut labels, config.min_cluster_size);

    let real_clusters = build_clusters(embeddings, &labels);
    let probabilities = compute_probabilities(embeddings, &labels, &real_clusters, config);
    let clusters = promote_noise_to_degenerate_clusters(real_clusters, embeddings, &labels);

    ClusteringOutput {
        labels,
        probabilities,
        clusters,
    }
}

/// Append one degenerate one-point [`RawCluster`] per noise-labeled
/// point, in index order, after the real clusters already built.
fn promote_noise_to_degenerate_clusters(
    mut real_clusters: Vec<RawCluster>,
    embeddings: &[Vec<f32>],
    labels: &[i64],
) -> Vec<RawCluster> {
    let mut next_id = real_clusters.len();
    for (i, &label) in labels.iter().enumerate() {
        if label != NOISE_LABEL {
            continue;
        }
        real_clusters.push(RawCluster {
            id: next_id,
            member_indices: vec![i],
            centroid: mean_vector(std::iter::once(embeddings[i].clone()), 1),
            intra_distance_mean: 0.0,
            intra_distance_std: 0.0,
            intra_distance_max: 0.0,
        });
        next_id += 1;
    }
    real_clusters
}

fn enforce_min_cluster_size(labels: &mut [i64], min_cluster_size: usize) {
    use std::collections::HashMap;

    let mut sizes: HashMap<i64, usize> = HashMap::new();
    for &label in labels.iter() {
        if label != NOISE_LABEL {
            *sizes.entry(label).or_default() += 1;
        }
    }

    for label in labels.iter_mut() {
        if *label != NOISE_LABEL && sizes[label] < min_cluster_size {
            *label = NOISE_LABEL;
        }
    }
}

fn mean_vector(vectors: impl Iterator<Item = Vec<f32>>, count: usize) -> Vec<f32> {
    let mut sum: Vec<f32> = Vec::new();
    for v in vectors {
        if sum.is_empty() {
            sum = vec![0.0; v.len()];
        }
        for (s, x) in sum.iter_mut().zip(&v) {
            *s += x;
        }
    }
    let n = count.max(1) as f32;
    for s in &mut sum {
        *s /= n;
    }
    let magnitude = sum.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for s in &mut sum {
            *s /= magnitude;
        }
    }
    sum
}

fn build_clusters(embeddings: &[Vec<f32>], labels: &[i64]) -> Vec<RawCluster> {
    use std::collections::BTreeMap;

    let mut by_label: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label != NOISE_LABEL {
            by_label.entry(label).or_default().push(i);
        }
    }

    by_label
        .into_iter()
        .enumerate()
        .map(|(dense_id, (_, member_indices))| {
            let centroid = mean_vector(
                member_indices.iter().map(|&i| embeddings[i].clone()),
                member_indices.len(),
            );

            let distances: Vec<f64> = member_indices
                .iter()
                .map(|&i| cosine_distance(&embeddings[i], &centroid))
                .collect();

            let mean = distances.iter().sum::<f64>() / distances.len() as f64;
            let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>()
                / distances.len() as f64;
            let max = distances.iter().cloned().fold(0.0_f64, f64::max);

            RawCluster {
                id: dense_id,
                member_indices,
                centroid,
                intra_distance_mean: mean,
                intra_distance_std: variance.sqrt(),
                intra_distance_max: max,
            }
        })
        .collect()
}

fn compute_probabilities(
    embeddings: &[Vec<f32>],
    labels: &[i64],
    clusters: &[RawCluster],
    config: &EngineConfig,
) -> Vec<f64> {
    let mut probabilities = vec![0.0; embeddings.len()];
    for cluster in clusters {
        let spread = cluster.intra_distance_max.max(config.score_epsilon);
        for &i in &cluster.member_indices {
            debug_assert_eq!(labels[i], cluster.id as i64);
            let distance = cosine_distance(&embeddings[i], &cluster.centroid);
            probabilities[i] = (1.0 - distance / spread).clamp(0.0, 1.0);
        }
    }
    probabilities
}
