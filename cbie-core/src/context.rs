//! Explicitly injected collaborators (spec.md §9: "Global service
//! singletons become explicitly injected collaborators").
//!
//! One [`EngineContext`] bundles every repository, provider, and the
//! configuration an analysis task needs — no ambient global state.

use crate::archetype::LLMProvider;
use crate::config::EngineConfig;
use crate::embeddings::{EmbeddingCache, EmbeddingGateway, EmbeddingProvider};
use crate::repository::{AuditLog, ObservationRepository, ProfileRepository, PromptRepository};
use std::sync::Arc;

/// Everything one analysis or correction task needs to run, built once
/// per process and shared across concurrent per-user tasks.
pub struct EngineContext {
    pub observations: Arc<dyn ObservationRepository>,
    pub prompts: Arc<dyn PromptRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub audit_log: Arc<dyn AuditLog>,
    pub embedding_gateway: Arc<EmbeddingGateway>,
    pub llm_provider: Option<Arc<dyn LLMProvider>>,
    pub config: EngineConfig,
}

impl EngineContext {
    /// Build a context from its collaborators and an embedding provider,
    /// constructing the shared [`EmbeddingCache`]/[`EmbeddingGateway`]
    /// internally.
    #[must_use]
    pub fn new(
        observations: Arc<dyn ObservationRepository>,
        prompts: Arc<dyn PromptRepository>,
        profiles: Arc<dyn ProfileRepository>,
        audit_log: Arc<dyn AuditLog>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Option<Arc<dyn LLMProvider>>,
        config: EngineConfig,
    ) -> Self {
        let cache = Arc::new(EmbeddingCache::new());
        let embedding_gateway = Arc::new(EmbeddingGateway::new(embedding_provider, cache, &config));

        Self {
            observations,
            prompts,
            profiles,
            audit_log,
            embedding_gateway,
            llm_provider,
            config,
        }
    }
}
