//! Engine configuration.
//!
//! One typed config object covering every tunable named in spec.md §6,
//! in the style of the teacher's `DBSCANConfig`/`RetryConfig`: a
//! `Default` impl encoding the spec's numeric defaults, builder-style
//! `with_*` methods, and a `validate` that rejects out-of-range values
//! at construction time rather than letting them silently corrupt a
//! scoring run.

use crate::error::{Error, Result};

/// Tier thresholds for [`crate::tier::classify`] (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierThresholds {
    /// Minimum `cluster_strength` for PRIMARY.
    pub primary_strength: f64,
    /// Minimum `confidence` for PRIMARY.
    pub primary_confidence: f64,
    /// Minimum `cluster_strength` for SECONDARY.
    pub secondary_strength: f64,
    /// Minimum `confidence` for SECONDARY.
    pub secondary_confidence: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        // spec.md §4.5's operative table: PRIMARY >= 1.0 strength /
        // 0.6 confidence, SECONDARY >= 0.7 strength / 0.5 confidence.
        // See DESIGN.md Open Question 2 for why this pair was chosen
        // over the alternative 0.80/0.50 pair named in §9.
        Self {
            primary_strength: 1.0,
            primary_confidence: 0.6,
            secondary_strength: 0.7,
            secondary_confidence: 0.5,
        }
    }
}

/// All tunables named in spec.md §6 ("Configuration").
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Credibility exponent in the Behavior Weight formula (spec.md §4.1).
    pub alpha: f64,
    /// Clarity exponent.
    pub beta: f64,
    /// Extraction-confidence exponent.
    pub gamma: f64,
    /// Reinforcement-count coefficient in the ABW formula.
    pub r: f64,
    /// Recency decay coefficient used in cluster strength (spec.md §4.4).
    pub lambda_recency: f64,
    /// Minimum number of observations to form a non-degenerate cluster.
    pub min_cluster_size: usize,
    /// HDBSCAN-equivalent `min_samples` parameter (spec.md §4.3).
    pub min_samples: usize,
    /// HDBSCAN-equivalent `cluster_selection_epsilon`.
    pub cluster_selection_epsilon: f64,
    /// Maximum number of texts sent to the embedding provider per batch.
    pub embed_batch: usize,
    /// PRIMARY/SECONDARY/NOISE thresholds.
    pub tier_thresholds: TierThresholds,
    /// Cosine-distance threshold for carrying a hidden cluster's
    /// visibility forward across runs (spec.md §4.7).
    pub tau_hide: f64,
    /// Clamp floor for credibility/clarity/extraction_confidence inputs
    /// to the Behavior Weight formula (spec.md §4.1's `ε`).
    pub score_epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: 0.35,
            beta: 0.40,
            gamma: 0.25,
            r: 0.01,
            lambda_recency: 0.01,
            min_cluster_size: 2,
            min_samples: 1,
            cluster_selection_epsilon: 0.15,
            embed_batch: 64,
            tier_thresholds: TierThresholds::default(),
            tau_hide: 0.2,
            score_epsilon: 1e-6,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tier_thresholds(mut self, thresholds: TierThresholds) -> Self {
        self.tier_thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn with_embed_batch(mut self, embed_batch: usize) -> Self {
        self.embed_batch = embed_batch;
        self
    }

    #[must_use]
    pub fn with_tau_hide(mut self, tau_hide: f64) -> Self {
        self.tau_hide = tau_hide;
        self
    }

    /// Reject configurations that cannot produce meaningful scores.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] describing the first invalid
    /// field found.
    pub fn validate(&self) -> Result<()> {
        let weight_exponents = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
        ];
        for (name, value) in weight_exponents {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Configuration(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }

        if self.r < 0.0 {
            return Err(Error::Configuration(format!(
                "r must be non-negative, got {}",
                self.r
            )));
        }

        if self.lambda_recency < 0.0 {
            return Err(Error::Configuration(format!(
                "lambda_recency must be non-negative, got {}",
                self.lambda_recency
            )));
        }

        if self.min_cluster_size == 0 {
            return Err(Error::Configuration(
                "min_cluster_size must be at least 1".into(),
            ));
        }

        if self.min_samples == 0 {
            return Err(Error::Configuration(
                "min_samples must be at least 1".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.cluster_selection_epsilon) {
            return Err(Error::Configuration(format!(
                "cluster_selection_epsilon must be in [0, 2], got {}",
                self.cluster_selection_epsilon
            )));
        }

        if self.embed_batch == 0 {
            return Err(Error::Configuration("embed_batch must be at least 1".into()));
        }

        if !(0.0..=1.0).contains(&self.tau_hide) {
            return Err(Error::Configuration(format!(
                "tau_hide must be in [0, 1], got {}",
                self.tau_hide
            )));
        }

        let t = &self.tier_thresholds;
        if t.secondary_strength > t.primary_strength {
            return Err(Error::Configuration(
                "secondary strength threshold must not exceed primary".into(),
            ));
        }
        if t.secondary_confidence > t.primary_confidence {
            return Err(Error::Configuration(
                "secondary confidence threshold must not exceed primary".into(),
            ));
        }

        if self.score_epsilon <= 0.0 {
            return Err(Error::Configuration(
                "score_epsilon must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        let config = EngineConfig {
            alpha: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_min_cluster_size() {
        let config = EngineConfig {
            min_cluster_size: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_tier_thresholds() {
        let config = EngineConfig {
            tier_thresholds: TierThresholds {
                primary_strength: 0.5,
                primary_confidence: 0.6,
                secondary_strength: 0.7,
                secondary_confidence: 0.5,
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
