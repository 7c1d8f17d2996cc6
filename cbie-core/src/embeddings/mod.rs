//! Text embedding capability: provider interface, shared cache, and the
//! batching/retry gateway built on top of both (spec.md §4.2, §6).

pub mod cache;
pub mod gateway;
pub mod provider;

pub use cache::EmbeddingCache;
pub use gateway::EmbeddingGateway;
pub use provider::EmbeddingProvider;
