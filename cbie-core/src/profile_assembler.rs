//! # Profile Assembler (C7)
//!
//! Produces the committed [`Profile`] for one analysis run: carries
//! `is_hidden` forward from the prior profile by canonical-label plus
//! nearest-centroid match, writes atomically via [`ProfileRepository`],
//! and emits an audit event (spec.md §4.7).

use crate::clustering::cosine_distance;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::repository::{AuditEvent, AuditLog, ProfileRepository};
use crate::types::{Archetype, Cluster, ClusterIdentity, Profile, ProfileSettings};
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

/// Carry `is_hidden` forward onto `clusters` by matching each hidden
/// identity from `prior_settings` via canonical-label agreement plus
/// nearest-centroid (cosine) within `config.tau_hide` (spec.md §4.7, §8
/// invariant 4).
///
/// Clusters sharing the hidden identity's `canonical_label` are tried
/// first; only when none of those fall within `tau_hide` do we fall
/// back to the nearest centroid among all clusters regardless of
/// label, which covers harmless label drift (re-selection of the
/// canonical member wording) without letting an unrelated,
/// differently-labeled cluster win over a same-labeled one that is
/// merely a bit farther away. Each hidden identity matches at most one
/// cluster (its nearest), so two clusters can never both claim the
/// same prior hidden identity.
pub fn carry_over_visibility(clusters: &mut [Cluster], prior_settings: &ProfileSettings, config: &EngineConfig) {
    for identity in &prior_settings.hidden_cluster_identities {
        let matched = nearest_within_threshold(clusters, identity, config, true)
            .or_else(|| nearest_within_threshold(clusters, identity, config, false));

        if let Some(index) = matched {
            clusters[index].is_hidden = true;
        }
    }
}

/// Index of the nearest cluster to `identity`'s centroid within
/// `config.tau_hide`. When `require_label_match` is set, only clusters
/// whose `canonical_label` equals `identity.canonical_label` are
/// considered.
fn nearest_within_threshold(
    clusters: &[Cluster],
    identity: &ClusterIdentity,
    config: &EngineConfig,
    require_label_match: bool,
) -> Option<usize> {
    clusters
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.centroid.is_empty() && (!require_label_match || c.canonical_label == identity.canonical_label))
        .map(|(index, c)| (index, cosine_distance(&c.centroid, &identity.centroid)))
        .filter(|(_, distance)| *distance <= config.tau_hide)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(index, _)| index)
}

/// Assemble, persist, and audit the final [`Profile`] for one analysis
/// run.
///
/// # Errors
///
/// Propagates repository or audit-log failures. The caller is expected
/// to have already checked for cancellation before calling this —
/// once called, the write is not interruptible.
#[instrument(skip(clusters, archetype, profile_repository, audit_log, prior_settings))]
#[allow(clippy::too_many_arguments)]
pub async fn assemble_and_commit(
    user_id: Uuid,
    mut clusters: Vec<Cluster>,
    archetype: Option<Archetype>,
    observation_count: usize,
    run_at: DateTime<Utc>,
    prior_settings: ProfileSettings,
    config: &EngineConfig,
    profile_repository: &dyn ProfileRepository,
    audit_log: &dyn AuditLog,
) -> Result<Profile> {
    carry_over_visibility(&mut clusters, &prior_settings, config);

    let profile = Profile {
        user_id,
        analysis_metadata: crate::types::AnalysisMetadata {
            run_at,
            observation_count,
            cluster_count: clusters.len(),
        },
        behavior_clusters: clusters,
        archetype,
        settings: prior_settings,
    };

    profile_repository.upsert(&profile).await?;
    audit_log
        .record(AuditEvent::AnalysisCompleted {
            user_id,
            cluster_count: profile.behavior_clusters.len(),
            observation_count,
        })
        .await?;

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClusterIdentity, Tier};

    fn cluster(centroid: Vec<f32>) -> Cluster {
        Cluster {
            cluster_id: Uuid::new_v4(),
            observation_ids: vec![Uuid::new_v4()],
            cluster_size: 2,
            canonical_label: "x".into(),
            cluster_name: None,
            wording_variations: vec!["x".into()],
            prompt_ids: Default::default(),
            centroid,
            cluster_strength: 1.2,
            confidence: 0.7,
            consistency_score: 0.9,
            reinforcement_score: 0.5,
            clarity_trend: 0.5,
            tier: Tier::Primary,
            first_seen_at: Utc::now(),
            last_seen_at: Utc::now(),
            days_active: 0.0,
            is_hidden: false,
        }
    }

    #[test]
    fn carries_hidden_state_within_threshold() {
        let config = EngineConfig::default();
        let mut clusters = vec![cluster(vec![1.0, 0.0])];
        let settings = ProfileSettings {
            hidden_cluster_identities: vec![ClusterIdentity {
                canonical_label: "x".into(),
                centroid: vec![0.999, 0.001],
            }],
            ..ProfileSettings::default()
        };
        carry_over_visibility(&mut clusters, &settings, &config);
        assert!(clusters[0].is_hidden);
    }

    #[test]
    fn does_not_carry_hidden_state_beyond_threshold() {
        let config = EngineConfig::default();
        let mut clusters = vec![cluster(vec![1.0, 0.0])];
        let settings = ProfileSettings {
            hidden_cluster_identities: vec![ClusterIdentity {
                canonical_label: "y".into(),
                centroid: vec![0.0, 1.0],
            }],
            ..ProfileSettings::default()
        };
        carry_over_visibility(&mut clusters, &settings, &config);
        assert!(!clusters[0].is_hidden);
    }

    #[test]
    fn falls_back_to_centroid_only_when_label_has_drifted() {
        // The canonical_label can be re-selected run to run (a different
        // member became the representative wording); with no label match
        // available at all, the nearest centroid within tau_hide still
        // carries the hidden state forward.
        let config = EngineConfig::default();
        let mut relabeled = cluster(vec![0.999, 0.001]);
        relabeled.canonical_label = "a different phrasing of the same cluster".into();
        let mut clusters = vec![relabeled];
        let settings = ProfileSettings {
            hidden_cluster_identities: vec![ClusterIdentity {
                canonical_label: "x".into(),
                centroid: vec![1.0, 0.0],
            }],
            ..ProfileSettings::default()
        };
        carry_over_visibility(&mut clusters, &settings, &config);
        assert!(clusters[0].is_hidden);
    }

    #[test]
    fn prefers_label_match_over_a_closer_unlabeled_centroid() {
        // Both candidates are within tau_hide (0.2) of the hidden identity's
        // centroid, but only one shares its canonical_label.
        let config = EngineConfig::default();
        let mut closer_wrong_label = cluster(vec![0.9848, 0.1736]);
        closer_wrong_label.canonical_label = "unrelated topic".into();
        let mut farther_right_label = cluster(vec![0.9397, 0.3420]);
        farther_right_label.canonical_label = "x".into();
        let mut clusters = vec![closer_wrong_label, farther_right_label];
        let settings = ProfileSettings {
            hidden_cluster_identities: vec![ClusterIdentity {
                canonical_label: "x".into(),
                centroid: vec![1.0, 0.0],
            }],
            ..ProfileSettings::default()
        };
        carry_over_visibility(&mut clusters, &settings, &config);
        assert!(!clusters[0].is_hidden);
        assert!(clusters[1].is_hidden);
    }

    #[test]
    fn no_prior_hidden_identities_is_a_no_op() {
        let config = EngineConfig::default();
        let mut clusters = vec![cluster(vec![1.0, 0.0])];
        carry_over_visibility(&mut clusters, &ProfileSettings::default(), &config);
        assert!(!clusters[0].is_hidden);
    }
}
