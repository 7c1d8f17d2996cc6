//! # Repository and Audit Abstractions (spec.md §6)
//!
//! Injected collaborators for the three persisted collections
//! (`observations`, `prompts`, `profiles`) plus the append-only audit
//! log. Grounded on the teacher's `StorageBackend` trait: `async_trait`,
//! `Result<Option<T>>` for point lookups, per-document atomicity
//! assumed by the caller.

use crate::error::Result;
use crate::types::{ClusterIdentity, Observation, Profile, ProfileSettings, Prompt};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Access to a user's observations.
///
/// # Errors
///
/// Every method returns [`crate::error::Error::Storage`] on a backend
/// failure; `None`/empty results represent "not found", not an error.
#[async_trait]
pub trait ObservationRepository: Send + Sync {
    /// All active observations for `user_id`, in an implementation-defined
    /// but stable order.
    async fn list_active(&self, user_id: Uuid) -> Result<Vec<Observation>>;

    /// Soft-delete one observation. No-op (not an error) if it is
    /// already deleted.
    async fn soft_delete(&self, user_id: Uuid, observation_id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Record a user-supplied report reason without deactivating the
    /// observation (spec.md §6: `report_observation` logs but does not
    /// recompute).
    async fn mark_reported(&self, user_id: Uuid, observation_id: Uuid, reason: String) -> Result<()>;

    /// Permanently remove every observation for `user_id` (grace-period
    /// profile deletion, spec.md §4.7).
    async fn purge(&self, user_id: Uuid) -> Result<()>;
}

/// Access to a user's prompts.
#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// Resolve a set of prompt ids to their full records. Ids with no
    /// matching prompt are silently omitted from the result.
    async fn list_by_ids(&self, prompt_ids: &[Uuid]) -> Result<Vec<Prompt>>;

    /// Permanently remove every prompt for `user_id`.
    async fn purge(&self, user_id: Uuid) -> Result<()>;
}

/// Access to the single profile per user.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the current profile, if one has ever been committed.
    async fn get(&self, user_id: Uuid) -> Result<Option<Profile>>;

    /// Atomically replace the profile for `profile.user_id`
    /// (replace-by-user_id upsert, spec.md §4.7).
    async fn upsert(&self, profile: &Profile) -> Result<()>;

    /// Flip `is_hidden` for one cluster identity without triggering
    /// reclustering (spec.md §6).
    async fn update_cluster_visibility(
        &self,
        user_id: Uuid,
        cluster_identity: &ClusterIdentity,
        hidden: bool,
    ) -> Result<()>;

    /// Replace a user's profile-level settings.
    async fn update_settings(&self, user_id: Uuid, settings: &ProfileSettings) -> Result<()>;

    /// Record a pending grace-period deletion.
    async fn schedule_delete(&self, user_id: Uuid, deletion_id: Uuid, complete_at: DateTime<Utc>) -> Result<()>;

    /// Cancel a pending grace-period deletion before `complete_at`.
    async fn cancel_delete(&self, user_id: Uuid, deletion_id: Uuid) -> Result<()>;

    /// Purge the profile itself after the grace period elapses.
    async fn hard_delete(&self, user_id: Uuid) -> Result<()>;
}

/// One entry in the append-only audit log (spec.md §6).
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// A full analysis run completed, successfully or not.
    AnalysisCompleted {
        user_id: Uuid,
        cluster_count: usize,
        observation_count: usize,
    },
    /// A full analysis run was cancelled before completion.
    AnalysisCancelled { user_id: Uuid },
    /// The archetype generator failed; analysis still committed.
    ArchetypeGenerationFailed { user_id: Uuid, reason: String },
    /// An invariant violation aborted analysis entirely (spec.md §7).
    InvariantViolation { user_id: Uuid, detail: String },
    /// A user-initiated correction command was accepted.
    CorrectionAccepted { user_id: Uuid, command: String },
}

/// Append-only record of user actions and analysis outcomes.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one event. Must never fail silently; if the backend is
    /// unavailable, propagate the error rather than dropping the event.
    async fn record(&self, event: AuditEvent) -> Result<()>;
}
