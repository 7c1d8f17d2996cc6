//! # Archetype Generator (C6)
//!
//! Best-effort LLM summarization of a profile's PRIMARY clusters (or,
//! absent any, its top SECONDARY clusters) into one archetype label +
//! description (spec.md §4.6). Never fails the surrounding analysis:
//! any provider error collapses to `None`.

use crate::types::{Archetype, Cluster, Tier};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{instrument, warn};

/// How many SECONDARY clusters to summarize when no PRIMARY cluster exists.
const SECONDARY_FALLBACK_COUNT: usize = 3;

/// Timeout for one archetype generation call (spec.md §5).
const ARCHETYPE_TIMEOUT: Duration = Duration::from_secs(20);

/// One cluster's numbers as seen by the archetype generator. No raw
/// prompt text ever reaches this layer (spec.md §4.6) — only canonical
/// labels and aggregate scores, so disabling archetype generation can
/// never change the determinism of upstream scores.
#[derive(Debug, Clone)]
pub struct ClusterSummary {
    pub canonical_label: String,
    pub cluster_strength: f64,
    pub confidence: f64,
    pub cluster_size: usize,
}

impl From<&Cluster> for ClusterSummary {
    fn from(cluster: &Cluster) -> Self {
        Self {
            canonical_label: cluster.canonical_label.clone(),
            cluster_strength: cluster.cluster_strength,
            confidence: cluster.confidence,
            cluster_size: cluster.cluster_size,
        }
    }
}

/// External LLM capability used for canonical-label synthesis and
/// archetype summarization (spec.md §6).
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Synthesize a short (<=6 words) label from a cluster's distinct
    /// wordings. Used to override step-1 canonical label selection.
    async fn generate_label(&self, variations: &[String]) -> anyhow::Result<String>;

    /// Summarize a set of cluster summaries into one archetype.
    async fn generate_archetype(
        &self,
        cluster_summaries: &[ClusterSummary],
    ) -> anyhow::Result<Archetype>;
}

/// Choose the clusters fed to the archetype generator: all PRIMARY
/// clusters, or (if there are none) the strongest
/// [`SECONDARY_FALLBACK_COUNT`] SECONDARY clusters.
#[must_use]
pub fn select_input_clusters(clusters: &[Cluster]) -> Vec<&Cluster> {
    let primary: Vec<&Cluster> = clusters.iter().filter(|c| c.tier == Tier::Primary).collect();
    if !primary.is_empty() {
        return primary;
    }

    let mut secondary: Vec<&Cluster> = clusters.iter().filter(|c| c.tier == Tier::Secondary).collect();
    secondary.sort_by(|a, b| b.cluster_strength.partial_cmp(&a.cluster_strength).unwrap_or(std::cmp::Ordering::Equal));
    secondary.truncate(SECONDARY_FALLBACK_COUNT);
    secondary
}

/// Best-effort archetype generation. Returns `None` (never an error)
/// if generation is disabled, times out, or the provider fails.
#[instrument(skip(provider, clusters))]
pub async fn generate_archetype(
    provider: Option<&(dyn LLMProvider)>,
    clusters: &[Cluster],
) -> Option<Archetype> {
    let provider = provider?;
    let inputs = select_input_clusters(clusters);
    if inputs.is_empty() {
        return None;
    }

    let summaries: Vec<ClusterSummary> = inputs.into_iter().map(ClusterSummary::from).collect();

    match tokio::time::timeout(ARCHETYPE_TIMEOUT, provider.generate_archetype(&summaries)).await {
        Ok(Ok(archetype)) => Some(archetype),
        Ok(Err(error)) => {
            warn!(%error, "archetype generation failed, falling back to null archetype");
            None
        }
        Err(_) => {
            warn!("archetype generation timed out, falling back to null archetype");
            None
        }
    }
}
