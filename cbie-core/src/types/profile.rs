//! The [`Profile`] aggregate (spec.md §3).

use super::cluster::{Cluster, ClusterIdentity};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// LLM-generated one-line personality summary over PRIMARY clusters
/// (spec.md §4.6). `None` whenever archetype generation is disabled or
/// failed — never a reason to fail the overall analysis.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Archetype {
    /// The archetype label itself.
    pub label: String,
    /// Optional longer description.
    pub description: Option<String>,
}

/// Metadata about the run that produced the current cluster set.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// The reference timestamp the run used (spec.md §4.1's `now`),
    /// injected rather than read from the wall clock.
    pub run_at: DateTime<Utc>,
    /// Number of active observations considered.
    pub observation_count: usize,
    /// Number of clusters produced, including NOISE and hidden ones.
    pub cluster_count: usize,
}

/// User-controlled privacy level for a profile. Not itself scored or
/// clustered; carried opaquely by the engine for the owning
/// application to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PrivacyLevel {
    /// Default: profile visible to the owning user only.
    Private,
    /// Profile may be shared with collaborators the user names
    /// elsewhere in the owning application.
    Shared,
}

impl Default for PrivacyLevel {
    fn default() -> Self {
        Self::Private
    }
}

/// Per-user settings mutated only by the Correction Coordinator, never
/// by an analysis run (spec.md §4.7, §6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProfileSettings {
    /// Sharing posture for this profile.
    pub privacy_level: PrivacyLevel,
    /// While `true`, `analyze` is a no-op (spec.md §6).
    pub detection_paused: bool,
    /// Identities of clusters the user has hidden, carried forward
    /// across analysis runs by nearest-centroid match.
    pub hidden_cluster_identities: Vec<ClusterIdentity>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            privacy_level: PrivacyLevel::default(),
            detection_paused: false,
            hidden_cluster_identities: Vec::new(),
        }
    }
}

/// Exactly one per `user_id`. Exclusively owns its clusters; weakly
/// references observations, which exist independently and survive
/// reclustering (spec.md §3 "Ownership").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    /// The user this profile belongs to.
    pub user_id: Uuid,
    /// All clusters from the most recent analysis run, including NOISE
    /// and hidden ones — callers filter by tier/visibility themselves.
    pub behavior_clusters: Vec<Cluster>,
    /// `None` if archetype generation is disabled, failed, or there
    /// were no PRIMARY/SECONDARY clusters to summarize.
    pub archetype: Option<Archetype>,
    /// Metadata about the run that produced `behavior_clusters`.
    pub analysis_metadata: AnalysisMetadata,
    /// User-controlled settings, independent of any one analysis run.
    pub settings: ProfileSettings,
}

impl Profile {
    /// An empty profile for a user with zero active observations
    /// (spec.md §7 "Missing input", §8 Scenario F).
    #[must_use]
    pub fn empty(user_id: Uuid, run_at: DateTime<Utc>, settings: ProfileSettings) -> Self {
        Self {
            user_id,
            behavior_clusters: Vec::new(),
            archetype: None,
            analysis_metadata: AnalysisMetadata {
                run_at,
                observation_count: 0,
                cluster_count: 0,
            },
            settings,
        }
    }

    /// Invariant check (spec.md §3): every contained cluster's member
    /// observations must belong to this profile's user. Since clusters
    /// only carry `observation_ids` (not full `Observation` records),
    /// this is checked by the caller against the observation set it
    /// clustered — see `pipeline::assert_single_user_ownership`.
    #[must_use]
    pub fn cluster_by_identity(&self, identity: &ClusterIdentity) -> Option<&Cluster> {
        self.behavior_clusters
            .iter()
            .find(|c| c.identity() == *identity)
    }
}
