//! Deterministic Quality Scorer (spec §4.6).
//!
//! Converts a single `Sample` into four clamped component scores and a
//! composite `metricScore` in `[0, 100]`. Consumed two ways: directly by
//! the Selector's utility function, and centered on its own midpoint by
//! the Outcome Recorder before it becomes the `Endpoint::update_quality`
//! delta.

use crate::config::Tuning;
use crate::models::Sample;

/// The four component scores that make up a `metricScore`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentScores {
    pub latency_score: f64,
    pub jitter_score: f64,
    pub loss_score: f64,
    pub throughput_score: f64,
}

impl ComponentScores {
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.latency_score + self.jitter_score + self.loss_score + self.throughput_score
    }
}

/// Compute the four component scores for `sample` using the configured
/// caps. A hard-failure sample scores the worst possible composite (all
/// components at their floor).
#[must_use]
pub fn component_scores(sample: &Sample, tuning: &Tuning) -> ComponentScores {
    if sample.hard_fail {
        return ComponentScores {
            latency_score: 0.0,
            jitter_score: 0.0,
            loss_score: 0.0,
            throughput_score: 0.0,
        };
    }

    let latency = sample.latency_ms.clamp(0.0, tuning.latency_cap_ms);
    let latency_score = (35.0 - latency / 25.0).clamp(0.0, 35.0);

    let jitter = sample.jitter_ms.clamp(0.0, tuning.jitter_cap_ms);
    let jitter_score = (25.0 - jitter).clamp(0.0, 25.0);

    let loss = sample.loss_rate.clamp(0.0, tuning.loss_cap);
    let loss_score = (25.0 * (1.0 - loss)).clamp(0.0, 25.0);

    let bps = sample.bps.clamp(0.0, tuning.bps_soft_cap);
    let throughput_score = ((1.0 + bps).log10() * 2.0).round().clamp(0.0, tuning.throughput_score_cap);

    ComponentScores {
        latency_score,
        jitter_score,
        loss_score,
        throughput_score,
    }
}

/// Composite `metricScore` in `[0, 100]` — the delta passed to
/// `updateQuality`.
#[must_use]
pub fn metric_score(sample: &Sample, tuning: &Tuning) -> f64 {
    component_scores(sample, tuning).sum().round().clamp(0.0, 100.0)
}
