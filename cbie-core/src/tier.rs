//! # Tier Classifier (C5)
//!
//! Maps `(cluster_strength, confidence)` to a [`Tier`] using
//! configured thresholds (spec.md §4.5).

use crate::config::TierThresholds;
use crate::types::{Cluster, Tier};

/// Classify one cluster's strength/confidence pair into a [`Tier`].
///
/// Ties break toward the lower tier: a cluster sitting exactly on a
/// boundary in one axis but short on the other does not round up.
/// Singleton clusters (`cluster_size == 1`) are always forced to
/// [`Tier::Noise`], regardless of strength — they are DBSCAN's
/// degenerate single-point case (spec.md §4.3, §4.5).
#[must_use]
pub fn classify(cluster_strength: f64, confidence: f64, cluster_size: usize, thresholds: &TierThresholds) -> Tier {
    if cluster_size <= 1 {
        return Tier::Noise;
    }

    if cluster_strength >= thresholds.primary_strength && confidence >= thresholds.primary_confidence {
        Tier::Primary
    } else if cluster_strength >= thresholds.secondary_strength && confidence >= thresholds.secondary_confidence {
        Tier::Secondary
    } else {
        Tier::Noise
    }
}

/// Classify `cluster` in place, setting its `tier` field.
pub fn classify_cluster(cluster: &mut Cluster, thresholds: &TierThresholds) {
    cluster.tier = classify(
        cluster.cluster_strength,
        cluster.confidence,
        cluster.cluster_size,
        thresholds,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> TierThresholds {
        TierThresholds::default()
    }

    #[test]
    fn exact_primary_boundary_is_primary() {
        assert_eq!(classify(1.0, 0.6, 4, &thresholds()), Tier::Primary);
    }

    #[test]
    fn just_below_primary_strength_falls_to_secondary_or_noise() {
        assert_eq!(classify(0.999, 0.9, 4, &thresholds()), Tier::Secondary);
    }

    #[test]
    fn just_below_secondary_is_noise() {
        assert_eq!(classify(0.69, 0.9, 4, &thresholds()), Tier::Noise);
    }

    #[test]
    fn singleton_is_always_noise() {
        assert_eq!(classify(5.0, 1.0, 1, &thresholds()), Tier::Noise);
    }

    #[test]
    fn high_strength_low_confidence_is_noise() {
        assert_eq!(classify(10.0, 0.1, 5, &thresholds()), Tier::Noise);
    }
}
