//! Full analysis pipeline: Observation/Prompt store → C1 → C2 → C3 →
//! C4 → C5 → C6 → C7 → Profile store (spec.md §2 "Data flow").
//!
//! Cancellation is checked between every component and at each batch
//! boundary inside C2 (spec.md §5). A cancelled run produces no
//! profile write.

use crate::aggregation::aggregate_cluster;
use crate::archetype;
use crate::clustering;
use crate::context::EngineContext;
use crate::correction::CancellationFlag;
use crate::error::{Error, Result};
use crate::profile_assembler;
use crate::repository::AuditEvent;
use crate::scoring::score_observation;
use crate::tier;
use crate::types::{Observation, Profile};
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Run a full analysis for `user_id` and commit the resulting profile.
///
/// `now` is the reference timestamp for all scoring and recency
/// (spec.md §4.1) — always caller-supplied, never `Utc::now()`, so a
/// run is reproducible.
///
/// # Errors
///
/// - [`Error::Cancelled`] if `cancellation` fires before the profile
///   write; no profile is written in that case.
/// - [`Error::Embedding`] if any active observation's text cannot be
///   embedded after retrying (fatal, spec.md §4.2(v)).
/// - [`Error::InvariantViolation`] if an observation belongs to a user
///   other than `user_id`, or its embedding has the wrong dimension.
///
/// An LLM failure during archetype generation is never an error here —
/// it degrades to `archetype: None` (spec.md §4.6).
#[instrument(skip(context, cancellation), fields(%user_id))]
pub async fn run_analysis(
    user_id: Uuid,
    now: DateTime<Utc>,
    context: &EngineContext,
    cancellation: &CancellationFlag,
) -> Result<Profile> {
    let existing_profile = context.profiles.get(user_id).await?;
    let prior_settings = existing_profile
        .as_ref()
        .map(|p| p.settings.clone())
        .unwrap_or_default();

    if prior_settings.detection_paused {
        info!(%user_id, "detection paused, analyze is a no-op");
        return Ok(existing_profile.unwrap_or_else(|| Profile::empty(user_id, now, prior_settings)));
    }

    check_cancelled(cancellation, user_id, context).await?;

    // C1 is folded into the loop below: scores are pure and cheap, no
    // separate suspension point.
    let observations = context.observations.list_active(user_id).await?;
    assert_single_user_ownership(user_id, &observations)?;

    if observations.is_empty() {
        let profile = Profile::empty(user_id, now, prior_settings);
        context.profiles.upsert(&profile).await?;
        context
            .audit_log
            .record(AuditEvent::AnalysisCompleted {
                user_id,
                cluster_count: 0,
                observation_count: 0,
            })
            .await?;
        return Ok(profile);
    }

    let scores: Vec<_> = observations
        .iter()
        .map(|o| score_observation(o, now, &context.config))
        .collect();

    check_cancelled(cancellation, user_id, context).await?;

    // C2
    let texts: Vec<String> = observations.iter().map(|o| o.text.clone()).collect();
    let embeddings = context.embedding_gateway.embed_texts(&texts).await?;

    check_cancelled(cancellation, user_id, context).await?;

    // C3
    let clustering_output = clustering::cluster(&embeddings, &context.config);

    check_cancelled(cancellation, user_id, context).await?;

    // C4 + C5
    let mut clusters = Vec::with_capacity(clustering_output.clusters.len());
    for raw in &clustering_output.clusters {
        let members: Vec<&Observation> = raw.member_indices.iter().map(|&i| &observations[i]).collect();
        let member_scores: Vec<_> = raw.member_indices.iter().map(|&i| scores[i]).collect();
        let mut cluster = aggregate_cluster(raw, &members, &member_scores, now, &context.config);
        tier::classify_cluster(&mut cluster, &context.config.tier_thresholds);
        clusters.push(cluster);
    }

    check_cancelled(cancellation, user_id, context).await?;

    // C6 — best-effort, never fails the run.
    let archetype = archetype::generate_archetype(context.llm_provider.as_deref(), &clusters).await;

    if archetype.is_none() && context.llm_provider.is_some() {
        context
            .audit_log
            .record(AuditEvent::ArchetypeGenerationFailed {
                user_id,
                reason: "llm provider failed or timed out".into(),
            })
            .await?;
    }

    check_cancelled(cancellation, user_id, context).await?;

    // C7
    let profile = profile_assembler::assemble_and_commit(
        user_id,
        clusters,
        archetype,
        observations.len(),
        now,
        prior_settings,
        &context.config,
        context.profiles.as_ref(),
        context.audit_log.as_ref(),
    )
    .await?;

    Ok(profile)
}

async fn check_cancelled(cancellation: &CancellationFlag, user_id: Uuid, context: &EngineContext) -> Result<()> {
    if cancellation.is_cancelled() {
        warn!(%user_id, "analysis cancelled");
        context
            .audit_log
            .record(AuditEvent::AnalysisCancelled { user_id })
            .await?;
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// spec.md §3 Profile invariant: every contained cluster's observations
/// must belong to the profile's user. Checked once up front against the
/// observation set about to be clustered, since clusters only carry
/// `observation_ids` afterward.
fn assert_single_user_ownership(user_id: Uuid, observations: &[Observation]) -> Result<()> {
    if let Some(offender) = observations.iter().find(|o| o.user_id != user_id) {
        return Err(Error::InvariantViolation(format!(
            "observation {} belongs to user {} but was listed under {}",
            offender.observation_id, offender.user_id, user_id
        )));
    }
    Ok(())
}
