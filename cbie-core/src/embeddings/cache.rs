//! Shared embedding cache, keyed by exact-text hash (spec.md §4.2, §5).
//!
//! Read-mostly and shared across users; writers take a short exclusive
//! lock, matching spec.md §5's resource model. `parking_lot::RwLock` is
//! used for the same reason the teacher reaches for it in
//! `patterns/effectiveness` and `storage`: it's uncontended in the
//! common (cache-hit) path and doesn't poison on panic.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash of the exact text of an observation, used as the cache key.
type TextHash = u64;

fn hash_text(text: &str) -> TextHash {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Process-wide cache of text -> L2-normalized embedding.
#[derive(Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<TextHash, Vec<f32>>>,
}

impl EmbeddingCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a cached embedding for `text`, if present.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.entries.read().get(&hash_text(text)).cloned()
    }

    /// Insert or overwrite the cached embedding for `text`.
    pub fn insert(&self, text: &str, embedding: Vec<f32>) {
        self.entries.write().insert(hash_text(text), embedding);
    }

    /// Number of cached entries. Exposed for tests and metrics only.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
