//! In-memory fakes for the repository/provider trait boundaries, used
//! by the scenario and invariant tests to drive the full pipeline
//! without a real storage backend or network call.

#![allow(dead_code)]

use async_trait::async_trait;
use cbie_core::error::Result;
use cbie_core::repository::{AuditEvent, AuditLog, ObservationRepository, ProfileRepository, PromptRepository};
use cbie_core::types::{ClusterIdentity, Observation, Profile, ProfileSettings, Prompt};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryObservationRepository {
    observations: Mutex<HashMap<Uuid, Observation>>,
}

impl InMemoryObservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, observation: Observation) {
        self.observations.lock().insert(observation.observation_id, observation);
    }

    /// Every active observation regardless of owner, bypassing the
    /// per-user filter `list_active` applies. Used to simulate a
    /// misbehaving repository implementation in tests.
    pub fn list_all_active_ignoring_owner(&self) -> Vec<Observation> {
        self.observations.lock().values().filter(|o| o.is_active).cloned().collect()
    }
}

#[async_trait]
impl ObservationRepository for InMemoryObservationRepository {
    async fn list_active(&self, user_id: Uuid) -> Result<Vec<Observation>> {
        Ok(self
            .observations
            .lock()
            .values()
            .filter(|o| o.user_id == user_id && o.is_active)
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, _user_id: Uuid, observation_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(o) = self.observations.lock().get_mut(&observation_id) {
            o.soft_delete(at);
        }
        Ok(())
    }

    async fn mark_reported(&self, _user_id: Uuid, observation_id: Uuid, reason: String) -> Result<()> {
        if let Some(o) = self.observations.lock().get_mut(&observation_id) {
            o.mark_reported(reason);
        }
        Ok(())
    }

    async fn purge(&self, user_id: Uuid) -> Result<()> {
        self.observations.lock().retain(|_, o| o.user_id != user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPromptRepository {
    prompts: Mutex<HashMap<Uuid, Prompt>>,
}

impl InMemoryPromptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, prompt: Prompt) {
        self.prompts.lock().insert(prompt.prompt_id, prompt);
    }
}

#[async_trait]
impl PromptRepository for InMemoryPromptRepository {
    async fn list_by_ids(&self, prompt_ids: &[Uuid]) -> Result<Vec<Prompt>> {
        let prompts = self.prompts.lock();
        Ok(prompt_ids.iter().filter_map(|id| prompts.get(id).cloned()).collect())
    }

    async fn purge(&self, user_id: Uuid) -> Result<()> {
        self.prompts.lock().retain(|_, p| p.user_id != user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.profiles.lock().get(&user_id).cloned())
    }

    async fn upsert(&self, profile: &Profile) -> Result<()> {
        self.profiles.lock().insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn update_cluster_visibility(
        &self,
        user_id: Uuid,
        cluster_identity: &ClusterIdentity,
        hidden: bool,
    ) -> Result<()> {
        if let Some(profile) = self.profiles.lock().get_mut(&user_id) {
            if let Some(cluster) = profile
                .behavior_clusters
                .iter_mut()
                .find(|c| c.identity() == *cluster_identity)
            {
                cluster.is_hidden = hidden;
            }
        }
        Ok(())
    }

    async fn update_settings(&self, user_id: Uuid, settings: &ProfileSettings) -> Result<()> {
        if let Some(profile) = self.profiles.lock().get_mut(&user_id) {
            profile.settings = settings.clone();
        }
        Ok(())
    }

    async fn schedule_delete(&self, _user_id: Uuid, _deletion_id: Uuid, _complete_at: DateTime<Utc>) -> Result<()> {
        Ok(())
    }

    async fn cancel_delete(&self, _user_id: Uuid, _deletion_id: Uuid) -> Result<()> {
        Ok(())
    }

    async fn hard_delete(&self, user_id: Uuid) -> Result<()> {
        self.profiles.lock().remove(&user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAuditLog {
    pub events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_archetype_failure(&self) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| matches!(e, AuditEvent::ArchetypeGenerationFailed { .. }))
    }
}

#[async_trait]
impl AuditLog for RecordingAuditLog {
    async fn record(&self, event: AuditEvent) -> Result<()> {
        self.events.lock().push(event);
        Ok(())
    }
}

fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 1469598103934665603;
    for byte in text.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

/// Coarse topic key for the stub embedding provider: texts about
/// analogical thinking (analogies, metaphors, worked examples) share
/// one topic and therefore land in the same cluster; everything else
/// is its own topic, keyed by the full text.
fn topic_of(text: &str) -> &str {
    const ANALOGICAL_THINKING: &[&str] = &["analog", "metaphor", "example"];
    if ANALOGICAL_THINKING.iter().any(|keyword| text.contains(keyword)) {
        return "analogical_thinking";
    }
    text
}

/// Deterministic stub embedding provider: every text gets a dominant
/// component on its topic's axis plus a small per-text jitter
/// component, so texts sharing a topic land close together in cosine
/// space (well within the default clustering epsilon) while texts from
/// different topics land far apart, without depending on a real
/// embedding model.
pub struct StubEmbeddingProvider {
    pub dimension: usize,
}

impl StubEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let topic_axis = (fnv1a(topic_of(text)) as usize) % self.dimension;
        vector[topic_axis] = 1.0;

        let jitter_axis = (fnv1a(text).rotate_right(17) as usize) % self.dimension;
        if jitter_axis != topic_axis {
            vector[jitter_axis] = 0.05;
        }

        let magnitude = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in &mut vector {
            *x /= magnitude;
        }
        vector
    }
}

#[async_trait]
impl cbie_core::embeddings::EmbeddingProvider for StubEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Embedding provider that places every distinct text on its own axis,
/// guaranteeing every observation clusters with only exact-text
/// duplicates. Used where scenarios need tight control over which
/// observations land in the same cluster.
pub struct IdentityEmbeddingProvider {
    pub dimension: usize,
}

#[async_trait]
impl cbie_core::embeddings::EmbeddingProvider for IdentityEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut hash: u64 = 1469598103934665603;
                for byte in text.as_bytes() {
                    hash ^= u64::from(*byte);
                    hash = hash.wrapping_mul(1099511628211);
                }
                let mut vector = vec![0.0f32; self.dimension];
                vector[(hash as usize) % self.dimension] = 1.0;
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// LLM provider that fails every call, for Scenario E (archetype
/// generator outage).
pub struct FailingLLMProvider;

#[async_trait]
impl cbie_core::archetype::LLMProvider for FailingLLMProvider {
    async fn generate_label(&self, _variations: &[String]) -> anyhow::Result<String> {
        anyhow::bail!("llm outage")
    }

    async fn generate_archetype(
        &self,
        _summaries: &[cbie_core::archetype::ClusterSummary],
    ) -> anyhow::Result<cbie_core::types::Archetype> {
        anyhow::bail!("llm outage")
    }
}

pub fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
}

/// Build a behaviorally-typical observation: high credibility/clarity/
/// extraction_confidence, reinforced, freshly seen.
pub fn make_observation(user_id: Uuid, text: &str, created_at: DateTime<Utc>, last_seen_at: DateTime<Utc>) -> Observation {
    let mut o = Observation::new(user_id, text, 0.95, 0.85, 0.80, 0.012, created_at, last_seen_at);
    o.reinforcement_count = 10;
    o
}
