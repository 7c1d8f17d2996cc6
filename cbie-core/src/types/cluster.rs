//! The [`Cluster`] artifact and its [`Tier`] classification (spec.md §3, §4.5).

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

#[cfg(feature = "proptest-arbitrary")]
use proptest::prelude::{prop_oneof, Arbitrary, BoxedStrategy, Just, Strategy};

/// PRIMARY / SECONDARY / NOISE classification of a cluster, derived
/// purely from `(cluster_strength, confidence)` by
/// [`crate::tier::classify`]. Never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Tier {
    /// Does not clear the SECONDARY bar, or is a forced-noise
    /// degenerate singleton.
    Noise,
    /// Clears the SECONDARY bar but not PRIMARY.
    Secondary,
    /// Clears the PRIMARY bar.
    Primary,
}

#[cfg(feature = "proptest-arbitrary")]
impl Arbitrary for Tier {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![Just(Self::Noise), Just(Self::Secondary), Just(Self::Primary)].boxed()
    }
}

/// A stable cross-run identity for a cluster, used only to carry
/// `is_hidden` forward (spec.md §4.7). Never an input to scoring.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClusterIdentity {
    /// The hidden cluster's canonical label at the time it was hidden.
    pub canonical_label: String,
    /// The hidden cluster's centroid at the time it was hidden.
    pub centroid: Vec<f32>,
}

/// A group of semantically similar observations — the primary analysis
/// artifact. Derived fresh on every analysis run; never user-editable
/// except for `is_hidden`, which is carried over from the prior run by
/// the Profile Assembler rather than written directly.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Cluster {
    /// Stable only within one analysis run; regenerated on every run.
    pub cluster_id: Uuid,
    /// Member observations, in the order the clustering engine and
    /// aggregator processed them. Length `>= 1`.
    pub observation_ids: Vec<Uuid>,
    /// `observation_ids.len()`.
    pub cluster_size: usize,
    /// Display-only representative label. Never an input to any score
    /// (spec.md §4.4 invariant).
    pub canonical_label: String,
    /// Optional longer descriptive phrase.
    pub cluster_name: Option<String>,
    /// All distinct `text` values among member observations.
    pub wording_variations: Vec<String>,
    /// Union of `prompt_ids` across member observations (spec.md §4.4).
    pub prompt_ids: BTreeSet<Uuid>,
    /// Mean of the member observations' normalized embeddings,
    /// renormalized.
    pub centroid: Vec<f32>,
    /// Unbounded, typically `< 3` (spec.md §4.4).
    pub cluster_strength: f64,
    /// `[0, 1]` reliability of the cluster as a real pattern.
    pub confidence: f64,
    /// `consistency` sub-score feeding `confidence`.
    pub consistency_score: f64,
    /// `reinforcement` sub-score feeding `confidence`.
    pub reinforcement_score: f64,
    /// `clarity_trend` sub-score feeding `confidence`.
    pub clarity_trend: f64,
    /// PRIMARY / SECONDARY / NOISE.
    pub tier: Tier,
    /// `min(created_at)` over members.
    pub first_seen_at: DateTime<Utc>,
    /// `max(last_seen_at)` over members.
    pub last_seen_at: DateTime<Utc>,
    /// `(last_seen_at - first_seen_at)` in days.
    pub days_active: f64,
    /// User-controlled visibility, carried over across runs by
    /// matching canonical label and nearest centroid (spec.md §4.7).
    pub is_hidden: bool,
}

impl Cluster {
    /// This cluster's stable cross-run identity, used for hide/unhide
    /// matching.
    #[must_use]
    pub fn identity(&self) -> ClusterIdentity {
        ClusterIdentity {
            canonical_label: self.canonical_label.clone(),
            centroid: self.centroid.clone(),
        }
    }
}
