//! # Correction Coordinator (C8)
//!
//! Mediates user corrections (spec.md §4.7, §6): soft-delete, hide/
//! unhide, pause/resume, grace-period profile deletion. Serializes
//! recomputation per user via [`PerUserAnalysisQueue`] and reports
//! typed outcomes rather than raw infrastructure errors.

pub mod queue;

pub use queue::CancellationFlag;

use crate::context::EngineContext;
use crate::error::{CorrectionOutcome, Error};
use crate::pipeline;
use crate::repository::AuditEvent;
use crate::types::{ClusterIdentity, Observation, PrivacyLevel, Profile, ProfileSettings, Prompt};
use chrono::{DateTime, Utc};
use queue::PerUserAnalysisQueue;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Grace period before a profile-delete command becomes irreversible
/// (spec.md §4.7).
pub const PROFILE_DELETE_GRACE_DAYS: i64 = 30;

/// Output format for [`CorrectionCoordinator::export`] (spec.md §6).
/// Only JSON is supported today; the enum exists so adding a format
/// later doesn't change the method's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
}

/// Full observation+cluster+settings dump for one user (spec.md §6
/// `export`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExportDump {
    pub user_id: Uuid,
    pub observations: Vec<Observation>,
    pub prompts: Vec<Prompt>,
    pub profile: Option<Profile>,
    pub exported_at: DateTime<Utc>,
}

/// Entry point for every correction command (spec.md §6's "Analysis
/// command surface").
pub struct CorrectionCoordinator {
    context: Arc<EngineContext>,
    queue: PerUserAnalysisQueue,
}

impl CorrectionCoordinator {
    #[must_use]
    pub fn new(context: Arc<EngineContext>) -> Self {
        Self {
            context,
            queue: PerUserAnalysisQueue::new(),
        }
    }

    /// `analyze(user_id)` (spec.md §6). Coalesces with any in-flight
    /// run for the same user.
    #[instrument(skip(self))]
    pub async fn analyze(&self, user_id: Uuid, now: DateTime<Utc>) {
        let context = Arc::clone(&self.context);
        self.queue
            .request(user_id, move |cancellation| {
                let context = Arc::clone(&context);
                async move {
                    if let Err(error) = pipeline::run_analysis(user_id, now, &context, &cancellation).await {
                        tracing::warn!(%user_id, %error, "analysis run failed");
                    }
                }
            })
            .await;
    }

    /// `delete_observation(user_id, observation_id)` (spec.md §6):
    /// soft-delete then enqueue a recompute.
    #[instrument(skip(self))]
    pub async fn delete_observation(
        &self,
        user_id: Uuid,
        observation_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), CorrectionOutcome> {
        self.context
            .observations
            .soft_delete(user_id, observation_id, now)
            .await
            .map_err(|e| map_storage_error(&e))?;

        self.context
            .audit_log
            .record(AuditEvent::CorrectionAccepted {
                user_id,
                command: "delete_observation".into(),
            })
            .await
            .ok();

        self.analyze(user_id, now).await;
        Ok(())
    }

    /// `report_observation(user_id, observation_id, reason)` (spec.md
    /// §6): log only, no recompute.
    #[instrument(skip(self))]
    pub async fn report_observation(
        &self,
        user_id: Uuid,
        observation_id: Uuid,
        reason: String,
    ) -> Result<(), CorrectionOutcome> {
        self.context
            .observations
            .mark_reported(user_id, observation_id, reason)
            .await
            .map_err(|e| map_storage_error(&e))?;

        self.context
            .audit_log
            .record(AuditEvent::CorrectionAccepted {
                user_id,
                command: "report_observation".into(),
            })
            .await
            .ok();

        Ok(())
    }

    /// `hide_cluster` / `unhide_cluster` (spec.md §6): visibility only,
    /// no reclustering.
    #[instrument(skip(self))]
    pub async fn set_cluster_hidden(
        &self,
        user_id: Uuid,
        cluster_identity: ClusterIdentity,
        hidden: bool,
    ) -> Result<(), CorrectionOutcome> {
        let mut profile = self
            .context
            .profiles
            .get(user_id)
            .await
            .map_err(|e| map_storage_error(&e))?
            .ok_or(CorrectionOutcome::NotFound)?;

        if hidden {
            if !profile
                .settings
                .hidden_cluster_identities
                .iter()
                .any(|id| *id == cluster_identity)
            {
                profile.settings.hidden_cluster_identities.push(cluster_identity.clone());
            }
        } else {
            profile
                .settings
                .hidden_cluster_identities
                .retain(|id| *id != cluster_identity);
        }

        if let Some(cluster) = profile
            .behavior_clusters
            .iter_mut()
            .find(|c| c.identity() == cluster_identity)
        {
            cluster.is_hidden = hidden;
        }

        self.context
            .profiles
            .update_cluster_visibility(user_id, &cluster_identity, hidden)
            .await
            .map_err(|e| map_storage_error(&e))?;
        self.context
            .profiles
            .update_settings(user_id, &profile.settings)
            .await
            .map_err(|e| map_storage_error(&e))?;

        Ok(())
    }

    /// `pause(user_id)` (spec.md §6).
    #[instrument(skip(self))]
    pub async fn pause(&self, user_id: Uuid) -> Result<(), CorrectionOutcome> {
        self.set_paused(user_id, true).await
    }

    /// `resume(user_id)` (spec.md §6).
    #[instrument(skip(self))]
    pub async fn resume(&self, user_id: Uuid) -> Result<(), CorrectionOutcome> {
        self.set_paused(user_id, false).await
    }

    async fn set_paused(&self, user_id: Uuid, paused: bool) -> Result<(), CorrectionOutcome> {
        let mut settings = self
            .context
            .profiles
            .get(user_id)
            .await
            .map_err(|e| map_storage_error(&e))?
            .map(|p| p.settings)
            .unwrap_or_else(|| ProfileSettings {
                privacy_level: PrivacyLevel::default(),
                ..ProfileSettings::default()
            });
        settings.detection_paused = paused;
        self.context
            .profiles
            .update_settings(user_id, &settings)
            .await
            .map_err(|e| map_storage_error(&e))
    }

    /// `delete_profile(user_id)` (spec.md §6, §4.7): schedule a 30-day
    /// grace deletion and cancel any in-flight analysis.
    #[instrument(skip(self))]
    pub async fn delete_profile(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Uuid, CorrectionOutcome> {
        self.queue.cancel(user_id);

        let deletion_id = Uuid::new_v4();
        let complete_at = now + chrono::Duration::days(PROFILE_DELETE_GRACE_DAYS);
        self.context
            .profiles
            .schedule_delete(user_id, deletion_id, complete_at)
            .await
            .map_err(|e| map_storage_error(&e))?;

        Ok(deletion_id)
    }

    /// Cancel a pending grace-period deletion before it completes.
    #[instrument(skip(self))]
    pub async fn cancel_delete(&self, user_id: Uuid, deletion_id: Uuid) -> Result<(), CorrectionOutcome> {
        self.context
            .profiles
            .cancel_delete(user_id, deletion_id)
            .await
            .map_err(|e| map_storage_error(&e))
    }

    /// `export(user_id, format)` (spec.md §6): a full observation+
    /// cluster+settings dump for the user. Read-only — never triggers
    /// an analysis run or any recompute.
    #[instrument(skip(self))]
    pub async fn export(
        &self,
        user_id: Uuid,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> Result<String, CorrectionOutcome> {
        let observations = self
            .context
            .observations
            .list_active(user_id)
            .await
            .map_err(|e| map_storage_error(&e))?;
        let profile = self
            .context
            .profiles
            .get(user_id)
            .await
            .map_err(|e| map_storage_error(&e))?;

        let prompt_ids: Vec<Uuid> = profile
            .as_ref()
            .map(|p| {
                p.behavior_clusters
                    .iter()
                    .flat_map(|c| c.prompt_ids.iter().copied())
                    .collect::<BTreeSet<Uuid>>()
            })
            .unwrap_or_default()
            .into_iter()
            .collect();
        let prompts = self
            .context
            .prompts
            .list_by_ids(&prompt_ids)
            .await
            .map_err(|e| map_storage_error(&e))?;

        let dump = ExportDump {
            user_id,
            observations,
            prompts,
            profile,
            exported_at: now,
        };

        match format {
            ExportFormat::Json => {
                serde_json::to_string(&dump).map_err(|e| CorrectionOutcome::ValidationError(e.to_string()))
            }
        }
    }

    /// Complete a grace-period deletion: purge observations, prompts,
    /// and the profile itself.
    #[instrument(skip(self))]
    pub async fn complete_delete(&self, user_id: Uuid) -> Result<(), CorrectionOutcome> {
        self.context
            .observations
            .purge(user_id)
            .await
            .map_err(|e| map_storage_error(&e))?;
        self.context
            .prompts
            .purge(user_id)
            .await
            .map_err(|e| map_storage_error(&e))?;
        self.context
            .profiles
            .hard_delete(user_id)
            .await
            .map_err(|e| map_storage_error(&e))
    }
}

fn map_storage_error(error: &Error) -> CorrectionOutcome {
    match error {
        Error::NotFound { .. } => CorrectionOutcome::NotFound,
        Error::AlreadyDeleted { .. } => CorrectionOutcome::AlreadyDeleted,
        Error::Paused { .. } => CorrectionOutcome::Paused,
        other => CorrectionOutcome::ValidationError(other.to_string()),
    }
}
