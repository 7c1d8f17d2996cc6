//! # Score Calculator (C1)
//!
//! Per-observation Behavior Weight and Adjusted Behavior Weight
//! (spec.md §4.1). Pure function of one observation and an injected
//! reference timestamp — no I/O, deterministic, always finite and
//! non-negative.

use crate::config::EngineConfig;
use crate::types::Observation;
use chrono::{DateTime, Utc};

/// The two scores produced for one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationScore {
    /// Static quality score from credibility/clarity/extraction confidence.
    pub bw: f64,
    /// `bw` modulated by reinforcement and recency decay.
    pub abw: f64,
    /// Days between `now` and the observation's `last_seen_at`, floored at 0.
    pub days_since_last_seen: f64,
}

/// Clamp an input in `[0, 1]` (credibility/clarity/extraction_confidence)
/// to `[epsilon, 1]`, preventing a zero base from making `BW` collapse
/// to exactly zero or a negative/NaN exponent result.
fn clamp_unit(value: f64, epsilon: f64) -> f64 {
    value.clamp(epsilon, 1.0)
}

/// Compute `BW` and `ABW` for one observation relative to `now`.
///
/// `now` is always caller-supplied (never `Utc::now()`) so that a given
/// analysis run is reproducible — spec.md §4.1 calls this out explicitly
/// as "injected, not wall clock, for determinism in tests".
#[must_use]
pub fn score_observation(
    observation: &Observation,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> ObservationScore {
    let eps = config.score_epsilon;
    let credibility = clamp_unit(observation.credibility, eps);
    let clarity = clamp_unit(observation.clarity, eps);
    let extraction_confidence = clamp_unit(observation.extraction_confidence, eps);

    let bw = credibility.powf(config.alpha)
        * clarity.powf(config.beta)
        * extraction_confidence.powf(config.gamma);

    let days_since_last_seen = ((now - observation.last_seen_at).num_seconds() as f64 / 86_400.0)
        .max(0.0);

    let reinforcement_factor = 1.0 + config.r * f64::from(observation.reinforcement_count);
    let decay_factor = (-observation.decay_rate * days_since_last_seen).exp();
    let abw = bw * reinforcement_factor * decay_factor;

    ObservationScore {
        bw,
        abw,
        days_since_last_seen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn obs_at(
        credibility: f64,
        clarity: f64,
        extraction_confidence: f64,
        reinforcement_count: u32,
        decay_rate: f64,
        created_at: DateTime<Utc>,
        last_seen_at: DateTime<Utc>,
    ) -> Observation {
        let mut observation = Observation::new(
            Uuid::new_v4(),
            "prefers analogies",
            credibility,
            clarity,
            extraction_confidence,
            decay_rate,
            created_at,
            last_seen_at,
        );
        observation.reinforcement_count = reinforcement_count;
        observation
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn scores_are_finite_and_non_negative() {
        let config = EngineConfig::default();
        let now = now();
        let obs = obs_at(0.95, 0.85, 0.80, 10, 0.012, now, now);
        let score = score_observation(&obs, now, &config);
        assert!(score.bw.is_finite() && score.bw >= 0.0);
        assert!(score.abw.is_finite() && score.abw >= 0.0);
    }

    #[test]
    fn zero_inputs_do_not_collapse_to_exactly_zero() {
        let config = EngineConfig::default();
        let now = now();
        let obs = obs_at(0.0, 0.0, 0.0, 0, 0.01, now, now);
        let score = score_observation(&obs, now, &config);
        assert!(score.bw > 0.0);
    }

    #[test]
    fn reinforcement_increases_abw() {
        let config = EngineConfig::default();
        let now = now();
        let unreinforced = obs_at(0.9, 0.9, 0.9, 0, 0.01, now, now);
        let reinforced = obs_at(0.9, 0.9, 0.9, 20, 0.01, now, now);
        let a = score_observation(&unreinforced, now, &config);
        let b = score_observation(&reinforced, now, &config);
        assert!(b.abw > a.abw);
        assert_eq!(a.bw, b.bw, "reinforcement must not change BW itself");
    }

    #[test]
    fn decay_shrinks_abw_scenario_c() {
        // spec.md §8 Scenario C: 400 days old, credibility=0.9, decay_rate=0.02.
        let config = EngineConfig::default();
        let now = now();
        let created = now - chrono::Duration::days(400);
        let obs = obs_at(0.9, 0.9, 0.9, 0, 0.02, created, created);
        let score = score_observation(&obs, now, &config);
        let expected_decay = (-0.02_f64 * 400.0).exp();
        assert!((score.abw / score.bw - expected_decay).abs() < 1e-9);
        assert!(score.abw / score.bw < 5e-4, "expected ~3.4e-4 decay factor");
    }

    #[test]
    fn days_since_last_seen_floors_at_zero() {
        let config = EngineConfig::default();
        let now = now();
        let future = now + chrono::Duration::days(1);
        let obs = obs_at(0.9, 0.9, 0.9, 0, 0.01, now, future);
        let score = score_observation(&obs, now, &config);
        assert_eq!(score.days_since_last_seen, 0.0);
    }
}
