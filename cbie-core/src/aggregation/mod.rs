//! # Cluster Aggregator (C4)
//!
//! Turns one [`RawCluster`] (clustering engine output) plus its member
//! [`Observation`]s and [`ObservationScore`]s into a fully-populated
//! [`Cluster`] (spec.md §4.4): size, wording variations, temporal
//! extent, `cluster_strength`, `confidence` and its three sub-scores,
//! and a canonical label.
//!
//! `tier` is left at its default ([`Tier::Noise`]) here — classification
//! is [`crate::tier`]'s job, run after aggregation so that strength and
//! confidence are fully settled first.

use crate::clustering::{cosine_distance, RawCluster};
use crate::config::EngineConfig;
use crate::scoring::ObservationScore;
use crate::types::{Cluster, Observation, Tier};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Aggregate one raw cluster into a scored [`Cluster`].
///
/// `members` and `scores` must be parallel and in the same order as
/// `raw.member_indices` was built against — i.e. `members[k]` is the
/// observation for `raw.member_indices[k]`.
#[must_use]
pub fn aggregate_cluster(
    raw: &RawCluster,
    members: &[&Observation],
    scores: &[ObservationScore],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Cluster {
    assert_eq!(members.len(), scores.len());
    assert_eq!(members.len(), raw.member_indices.len());

    let cluster_size = members.len();

    let mut wording_variations: Vec<String> = members.iter().map(|o| o.text.clone()).collect();
    wording_variations.sort();
    wording_variations.dedup();

    let prompt_ids: BTreeSet<Uuid> = members.iter().flat_map(|o| o.prompt_ids.iter().copied()).collect();

    let first_seen_at = members.iter().map(|o| o.created_at).min().expect("non-empty cluster");
    let last_seen_at = members.iter().map(|o| o.last_seen_at).max().expect("non-empty cluster");
    let days_active = (last_seen_at - first_seen_at).num_seconds() as f64 / 86_400.0;

    let mean_abw = scores.iter().map(|s| s.abw).sum::<f64>() / cluster_size as f64;
    let days_since_last_seen = ((now - last_seen_at).num_seconds() as f64 / 86_400.0).max(0.0);
    let recency = (-config.lambda_recency * days_since_last_seen).exp();
    let cluster_strength = ((cluster_size + 1) as f64).ln() * mean_abw * recency;

    let consistency_score = 1.0 / (1.0 + raw.intra_distance_mean);
    let reinforcement_score = (((cluster_size + 1) as f64).ln() / 10.0_f64.ln()).min(1.0);
    let clarity_trend = clarity_trend(members, first_seen_at);

    let confidence = 0.4 * consistency_score + 0.4 * reinforcement_score + 0.2 * clarity_trend;

    let canonical_label = select_canonical_label(members, &raw.centroid);

    Cluster {
        cluster_id: Uuid::new_v4(),
        observation_ids: members.iter().map(|o| o.observation_id).collect(),
        cluster_size,
        canonical_label,
        cluster_name: None,
        wording_variations,
        centroid: raw.centroid.clone(),
        cluster_strength,
        confidence,
        consistency_score,
        reinforcement_score,
        clarity_trend,
        tier: Tier::Noise,
        first_seen_at,
        last_seen_at,
        days_active,
        is_hidden: false,
        prompt_ids,
    }
}

/// Slope of `clarity` over time, normalized to `[0, 1]` (spec.md §4.4).
/// Clusters too small to estimate a trend (`cluster_size < 3`) fall
/// back to mean clarity.
fn clarity_trend(members: &[&Observation], first_seen_at: DateTime<Utc>) -> f64 {
    if members.len() < 3 {
        return members.iter().map(|o| o.clarity).sum::<f64>() / members.len() as f64;
    }

    let xs: Vec<f64> = members
        .iter()
        .map(|o| (o.created_at - first_seen_at).num_seconds() as f64 / 86_400.0)
        .collect();
    let ys: Vec<f64> = members.iter().map(|o| o.clarity).collect();

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let covariance: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let variance_x: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();

    let slope = if variance_x > 0.0 { covariance / variance_x } else { 0.0 };

    let sigma = {
        let variance_y = ys.iter().map(|y| (y - mean_y).powi(2)).sum::<f64>() / n;
        variance_y.sqrt().max(1e-6)
    };

    0.5 + (slope / sigma).clamp(-1.0, 1.0) / 2.0
}

/// Pick the canonical label: highest `clarity`, ties broken by cosine
/// similarity to the centroid (spec.md §4.4, step 1). LLM-based
/// replacement (step 2) is the caller's responsibility — see
/// [`crate::archetype`].
fn select_canonical_label(members: &[&Observation], centroid: &[f32]) -> String {
    members
        .iter()
        .max_by(|a, b| {
            a.clarity
                .partial_cmp(&b.clarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let sim_a = similarity_to_centroid(a, centroid);
                    let sim_b = similarity_to_centroid(b, centroid);
                    sim_a.partial_cmp(&sim_b).unwrap_or(std::cmp::Ordering::Equal)
                })
        })
        .map(|o| o.text.clone())
        .unwrap_or_default()
}

fn similarity_to_centroid(observation: &Observation, centroid: &[f32]) -> f64 {
    observation
        .embedding
        .as_ref()
        .map(|embedding| 1.0 - cosine_distance(embedding, centroid))
        .unwrap_or(0.0)
}
