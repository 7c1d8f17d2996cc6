//! Crate-wide error types.
//!
//! One enum for internal pipeline failures (`Error`), one for the
//! typed outcomes the correction coordinator's command surface returns
//! to callers (`CorrectionOutcome`). Keeping them separate means a
//! caller driving `analyze`/`delete_observation`/`hide_cluster` never
//! has to match on storage-internal variants it can't act on (see
//! spec.md §7, "User-addressed errors").

use uuid::Uuid;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the behavior identification pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A repository call failed. Recoverable; the caller may retry.
    #[error("storage error: {0}")]
    Storage(String),

    /// The embedding provider could not produce a vector for every
    /// active observation. Fatal to the analysis run (spec.md §4.2,
    /// §7): clustering integrity depends on having every vector.
    #[error("embedding error: {0}")]
    Embedding(#[from] anyhow::Error),

    /// The LLM provider failed while generating an archetype or a
    /// canonical label. Recoverable at the call site: the caller falls
    /// back to `archetype = None` or the rule-based label.
    #[error("archetype generation error: {0}")]
    Archetype(String),

    /// No profile exists for this user.
    #[error("profile not found for user {user_id}")]
    NotFound {
        /// The user the caller asked about.
        user_id: Uuid,
    },

    /// The observation was already soft-deleted.
    #[error("observation {observation_id} already deleted")]
    AlreadyDeleted {
        /// The observation the caller tried to delete again.
        observation_id: Uuid,
    },

    /// Detection is paused for this user; `analyze` is a no-op.
    #[error("detection paused for user {user_id}")]
    Paused {
        /// The user whose detection is paused.
        user_id: Uuid,
    },

    /// Caller-supplied data failed schema validation at an external
    /// boundary (spec.md §9: ingest, repository read, repository write).
    #[error("validation failed: {0}")]
    ValidationError(String),

    /// A programmer error: an observation without a `user_id`, an
    /// embedding of the wrong dimension, a cluster whose members span
    /// more than one user. Never silently repaired (spec.md §7):
    /// abort the analysis and let the caller emit an incident audit
    /// entry.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The analysis was cancelled (spec.md §5) before it reached the
    /// profile-commit step. No profile write occurs.
    #[error("analysis cancelled")]
    Cancelled,

    /// A configuration value was rejected at construction time.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Serialization failure at a repository boundary.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error can be retried with backoff.
    ///
    /// Drives [`crate::retry::RetryPolicy`]: transient external failures
    /// (storage, embedding, archetype) are recoverable; invariant
    /// violations, validation failures, and cancellation are not —
    /// retrying them would just repeat a deterministic failure.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Embedding(_) | Error::Archetype(_))
    }
}

/// Typed outcome surfaced to callers of the correction command surface
/// (spec.md §6 "Analysis command surface"). Deliberately does not wrap
/// [`Error`]: the teacher pattern of collapsing internal plumbing
/// errors into a small caller-facing set applies here too.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CorrectionOutcome {
    /// No profile or observation exists for the given identifier.
    #[error("not found")]
    NotFound,
    /// The observation was already soft-deleted.
    #[error("already deleted")]
    AlreadyDeleted,
    /// Detection is paused for this user.
    #[error("paused")]
    Paused,
    /// The request failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_recoverable() {
        assert!(Error::Storage("timeout".into()).is_recoverable());
    }

    #[test]
    fn invariant_violations_are_not_recoverable() {
        assert!(!Error::InvariantViolation("missing user_id".into()).is_recoverable());
    }

    #[test]
    fn cancellation_is_not_recoverable() {
        assert!(!Error::Cancelled.is_recoverable());
    }

    #[test]
    fn archetype_failures_are_recoverable() {
        assert!(Error::Archetype("llm timeout".into()).is_recoverable());
    }
}
