//! The [`Observation`] record (spec.md §3).

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A single detected behavioral signal, immutable once created except
/// for the soft-delete fields.
///
/// Invariants (spec.md §3): once `is_active` is `false` it never
/// returns to `true`; `last_seen_at >= created_at`. Both are enforced
/// by construction — there is no public setter that can violate them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    /// Stable identifier, assigned by the upstream extractor.
    pub observation_id: Uuid,
    /// The user this observation belongs to.
    pub user_id: Uuid,
    /// Short phrase describing the detected behavior, e.g. "prefers
    /// visual learning".
    pub text: String,
    /// How trustworthy the extraction source is, in `[0, 1]`.
    pub credibility: f64,
    /// How unambiguous the extracted text is, in `[0, 1]`.
    pub clarity: f64,
    /// The extractor's own confidence in this observation, in `[0, 1]`.
    pub extraction_confidence: f64,
    /// Number of times this exact behavior has been reinforced by
    /// subsequent interactions.
    pub reinforcement_count: u32,
    /// Per-day exponential decay rate, must be `> 0`.
    pub decay_rate: f64,
    /// When this observation was first recorded.
    pub created_at: DateTime<Utc>,
    /// When this observation was last reinforced or re-observed.
    pub last_seen_at: DateTime<Utc>,
    /// Prompts that generated this observation.
    pub prompt_ids: BTreeSet<Uuid>,
    /// Fixed-dimension embedding, `None` until the embedding gateway
    /// fills it in.
    pub embedding: Option<Vec<f32>>,
    /// Whether this observation participates in analysis. Never flips
    /// back to `true` once cleared.
    pub is_active: bool,
    /// Whether the user soft-deleted this observation (as opposed to
    /// e.g. a future automated pruning mechanism).
    pub deleted_by_user: bool,
    /// When the observation was soft-deleted, if it was.
    pub deleted_at: Option<DateTime<Utc>>,
    /// User-supplied reason if the observation was reported instead of
    /// deleted.
    pub report_reason: Option<String>,
}

impl Observation {
    /// Build a new, active observation.
    ///
    /// # Panics
    ///
    /// Panics if `last_seen_at < created_at`, since that would violate
    /// the invariant at construction rather than later.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        text: impl Into<String>,
        credibility: f64,
        clarity: f64,
        extraction_confidence: f64,
        decay_rate: f64,
        created_at: DateTime<Utc>,
        last_seen_at: DateTime<Utc>,
    ) -> Self {
        assert!(
            last_seen_at >= created_at,
            "last_seen_at must not precede created_at"
        );
        Self {
            observation_id: Uuid::new_v4(),
            user_id,
            text: text.into(),
            credibility,
            clarity,
            extraction_confidence,
            reinforcement_count: 0,
            decay_rate,
            created_at,
            last_seen_at,
            prompt_ids: BTreeSet::new(),
            embedding: None,
            is_active: true,
            deleted_by_user: false,
            deleted_at: None,
            report_reason: None,
        }
    }

    /// Soft-delete this observation. Idempotent: deleting an already
    /// soft-deleted observation has no effect beyond (re)reporting the
    /// deletion timestamp unchanged.
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        if self.is_active {
            self.is_active = false;
            self.deleted_by_user = true;
            self.deleted_at = Some(at);
        }
    }

    /// Mark this observation as reported, without affecting `is_active`
    /// (spec.md §6: `report_observation` logs but does not recompute).
    pub fn mark_reported(&mut self, reason: impl Into<String>) {
        self.report_reason = Some(reason.into());
    }
}
