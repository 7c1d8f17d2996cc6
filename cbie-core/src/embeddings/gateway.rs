//! # Embedding Gateway (C2)
//!
//! Batched text -> vector calls to an external [`EmbeddingProvider`],
//! with caching, deduplication, retry-with-backoff, and per-batch
//! timeouts (spec.md §4.2, §5).
//!
//! Embedding failure is fatal to the analysis that requested it:
//! clustering integrity depends on having a vector for every active
//! observation, so `embed_texts` returns `Err` rather than skipping the
//! unresolvable text (spec.md §4.2(v), §7).

use crate::config::EngineConfig;
use crate::embeddings::cache::EmbeddingCache;
use crate::embeddings::provider::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::retry::{RetryConfig, RetryPolicy};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const PER_BATCH_TIMEOUT: Duration = Duration::from_secs(30);
const TOTAL_WALL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Normalize a vector to unit L2 length. Zero vectors are left as-is
/// (there is no meaningful direction to normalize to).
fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let magnitude = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in &mut vector {
            *x /= magnitude;
        }
    }
    vector
}

/// Batches, dedupes, caches, and retries calls to an [`EmbeddingProvider`].
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<EmbeddingCache>,
    batch_size: usize,
}

impl EmbeddingGateway {
    #[must_use]
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: Arc<EmbeddingCache>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            batch_size: config.embed_batch,
        }
    }

    /// Resolve an embedding for every text in `texts`, in the same
    /// order, L2-normalized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Embedding`] if the provider cannot produce a
    /// vector for some text after retrying — the whole call fails, no
    /// partial results are returned.
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut resolved: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut misses: HashMap<&str, Vec<usize>> = HashMap::new();

        for (i, text) in texts.iter().enumerate() {
            if let Some(cached) = self.cache.get(text) {
                resolved[i] = Some(cached);
            } else {
                misses.entry(text.as_str()).or_default().push(i);
            }
        }

        let unique_misses: Vec<&str> = misses.keys().copied().collect();
        debug!(
            cache_hits = texts.len() - misses.values().map(Vec::len).sum::<usize>(),
            unique_misses = unique_misses.len(),
            "resolved embedding cache hits"
        );

        let deadline = tokio::time::Instant::now() + TOTAL_WALL_TIMEOUT;

        for batch in unique_misses.chunks(self.batch_size) {
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Embedding(anyhow::anyhow!(
                    "embedding gateway exceeded total wall-clock budget of {:?}",
                    TOTAL_WALL_TIMEOUT
                )));
            }

            let batch_owned: Vec<String> = batch.iter().map(|s| (*s).to_string()).collect();
            let provider = Arc::clone(&self.provider);
            let mut policy = RetryPolicy::with_config(RetryConfig::embedding_gateway());

            let vectors = tokio::time::timeout(
                PER_BATCH_TIMEOUT,
                policy.execute(|| {
                    let provider = Arc::clone(&provider);
                    let batch_owned = batch_owned.clone();
                    async move {
                        provider
                            .embed_batch(&batch_owned)
                            .await
                            .map_err(Error::Embedding)
                    }
                }),
            )
            .await
            .map_err(|_| {
                warn!(batch_size = batch.len(), "embedding batch timed out");
                Error::Embedding(anyhow::anyhow!(
                    "embedding batch timed out after {:?}",
                    PER_BATCH_TIMEOUT
                ))
            })??;

            if vectors.len() != batch.len() {
                return Err(Error::Embedding(anyhow::anyhow!(
                    "embedding provider returned {} vectors for a batch of {}",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (text, vector) in batch.iter().zip(vectors) {
                let normalized = l2_normalize(vector);
                self.cache.insert(text, normalized.clone());
                for &i in &misses[text] {
                    resolved[i] = Some(normalized.clone());
                }
            }
        }

        resolved
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| {
                    Error::Embedding(anyhow::anyhow!(
                        "no embedding resolved for observation text at index {i}"
                    ))
                })
            })
            .collect()
    }
}
