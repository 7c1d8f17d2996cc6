//! The [`Prompt`] record (spec.md §3).

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source text that produced one or more observations. Immutable.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Prompt {
    /// Stable identifier.
    pub prompt_id: Uuid,
    /// The user this prompt came from.
    pub user_id: Uuid,
    /// The prompt text.
    pub text: String,
    /// When the prompt was issued.
    pub timestamp: DateTime<Utc>,
}

impl Prompt {
    #[must_use]
    pub fn new(user_id: Uuid, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            prompt_id: Uuid::new_v4(),
            user_id,
            text: text.into(),
            timestamp,
        }
    }
}
