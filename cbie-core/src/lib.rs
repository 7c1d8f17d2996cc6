#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unused_self)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::borrowed_box)]
#![allow(clippy::float_cmp)]
#![allow(clippy::ref_option)]

//! # Core Behavior Identification Engine
//!
//! Turns a user's raw behavior observations into a ranked, tiered
//! profile of behavior clusters plus a one-line archetype summary.
//!
//! ## Pipeline
//!
//! ```text
//! Observation+Prompt store -> scoring -> embeddings -> clustering
//!     -> aggregation -> tier -> archetype -> profile_assembler -> Profile store
//! ```
//!
//! [`pipeline::run_analysis`] drives the full sequence for one user.
//! [`correction::CorrectionCoordinator`] is the external entry point:
//! it serializes corrections per user, coalesces concurrent
//! recompute requests, and exposes typed outcomes instead of raw
//! infrastructure errors.
//!
//! ## Module map
//!
//! - [`scoring`]: per-observation Behavior Weight / Adjusted Behavior Weight.
//! - [`embeddings`]: batching, caching, and retrying calls to an external embedding provider.
//! - [`clustering`]: density-based clustering over cosine-normalized embeddings.
//! - [`aggregation`]: per-cluster strength, confidence, and canonical label.
//! - [`tier`]: PRIMARY/SECONDARY/NOISE classification.
//! - [`archetype`]: best-effort LLM summarization of PRIMARY clusters.
//! - [`profile_assembler`]: final profile assembly, hidden-cluster carry-over, commit.
//! - [`correction`]: per-user correction commands and the FIFO recompute queue.
//! - [`repository`]: injected storage/audit trait boundaries.
//! - [`context`]: bundles repositories, providers, and configuration for one process.
//!
//! ## Quick start
//!
//! ```no_run
//! use cbie_core::context::EngineContext;
//! use cbie_core::correction::CorrectionCoordinator;
//! use std::sync::Arc;
//!
//! # async fn example(context: Arc<EngineContext>, user_id: uuid::Uuid) {
//! let coordinator = CorrectionCoordinator::new(context);
//! coordinator.analyze(user_id, chrono::Utc::now()).await;
//! # }
//! ```

pub mod aggregation;
pub mod archetype;
pub mod clustering;
pub mod config;
pub mod context;
pub mod correction;
pub mod embeddings;
pub mod error;
pub mod pipeline;
pub mod profile_assembler;
pub mod repository;
pub mod retry;
pub mod scoring;
pub mod tier;
pub mod types;

pub use config::{EngineConfig, TierThresholds};
pub use context::EngineContext;
pub use error::{CorrectionOutcome, Error, Result};
pub use types::{
    AnalysisMetadata, Archetype, Cluster, ClusterIdentity, Observation, PrivacyLevel, Profile,
    ProfileSettings, Prompt, Tier,
};
