//! The external embedding capability interface (spec.md §6).

use async_trait::async_trait;

/// Converts text to fixed-dimension vectors. Implementations are
/// external collaborators — an HTTP client, a local model runner, or
/// (in tests) a deterministic stub — injected via
/// [`crate::context::EngineContext`].
///
/// Vectors returned by an implementor need not already be L2-normalized;
/// normalization happens once, at the [`crate::embeddings::gateway::EmbeddingGateway`]
/// boundary, per spec.md §4.2.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in the
    /// same order. Implementations should reject batches larger than
    /// they can serve; the gateway never sends more than its
    /// configured `embed_batch` size.
    ///
    /// # Errors
    ///
    /// Any error is treated as potentially transient by the gateway's
    /// retry policy; callers that want an error treated as permanent
    /// should still return `Err` — the gateway's retry budget bounds
    /// how long it spends on a truly permanent failure.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Fixed output dimension for this provider, e.g. 3072.
    fn dimension(&self) -> usize;
}
