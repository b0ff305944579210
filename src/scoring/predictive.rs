//! Predictive Scorer (spec §4.7): a post-request adjustment computed from
//! the recent sample window, applied on top of the deterministic Quality
//! Scorer delta.

use crate::config::Tuning;
use crate::models::stats::{coefficient_of_variation, percentile, std_dev, weighted_mean, weighted_trend, DEFAULT_DECAY};
use crate::models::Sample;

/// Extracted features over the recent sample window.
#[derive(Debug, Clone, Copy)]
pub struct PredictiveFeatures {
    pub weighted_latency: f64,
    pub p95_latency: f64,
    pub latency_std: f64,
    pub latency_cv: f64,
    pub loss: f64,
    pub jitter: f64,
    pub success_rate: f64,
    pub latency_trend: f64,
    pub loss_trend: f64,
    pub success_trend: f64,
    pub recent_quality: f64,
}

/// Extract features from a sample window. Callers should only do this once
/// `window.len() >= tuning.min_samples_for_prediction`.
#[must_use]
pub fn extract_features(window: &[Sample], recent_quality: f64) -> PredictiveFeatures {
    let latencies: Vec<f64> = window.iter().map(|s| s.latency_ms).collect();
    let losses: Vec<f64> = window.iter().map(|s| s.loss_rate).collect();
    let jitters: Vec<f64> = window.iter().map(|s| s.jitter_ms).collect();
    let successes: Vec<f64> = window.iter().map(|s| if s.counts_as_success() { 1.0 } else { 0.0 }).collect();

    PredictiveFeatures {
        weighted_latency: weighted_mean(&latencies, DEFAULT_DECAY),
        p95_latency: percentile(&latencies, 95.0),
        latency_std: std_dev(&latencies),
        latency_cv: coefficient_of_variation(&latencies),
        loss: weighted_mean(&losses, DEFAULT_DECAY),
        jitter: weighted_mean(&jitters, DEFAULT_DECAY),
        success_rate: successes.iter().sum::<f64>() / successes.len() as f64,
        latency_trend: weighted_trend(&latencies, DEFAULT_DECAY),
        loss_trend: weighted_trend(&losses, DEFAULT_DECAY),
        success_trend: weighted_trend(&successes, DEFAULT_DECAY),
        recent_quality,
    }
}

/// Weighted sum of normalized risk components, in `[0, 1]`. Weights
/// dynamically re-balance toward stability (latency volatility) and
/// jitter when the success rate drops below 0.8 or latency std exceeds
/// 50ms — an unstable endpoint should be penalized on volatility even if
/// its average numbers still look acceptable.
#[must_use]
pub fn risk(features: &PredictiveFeatures, tuning: &Tuning) -> f64 {
    let latency_component = (features.weighted_latency / tuning.latency_cap_ms).clamp(0.0, 1.0);
    let p95_component = (features.p95_latency / tuning.latency_cap_ms).clamp(0.0, 1.0);
    let volatility_component = (features.latency_cv).clamp(0.0, 1.0).max((features.latency_std / 200.0).clamp(0.0, 1.0));
    let loss_component = (features.loss / tuning.loss_cap.max(f64::EPSILON)).clamp(0.0, 1.0);
    let jitter_component = (features.jitter / tuning.jitter_cap_ms).clamp(0.0, 1.0);
    let failure_component = (1.0 - features.success_rate).clamp(0.0, 1.0);
    let worsening_trend = ((features.latency_trend.max(0.0) / 50.0) + (features.loss_trend.max(0.0) * 2.0) + (-features.success_trend).max(0.0)).clamp(0.0, 1.0);

    let mut weights = [
        ("latency", 0.20, latency_component),
        ("p95", 0.10, p95_component),
        ("volatility", 0.15, volatility_component),
        ("loss", 0.20, loss_component),
        ("jitter", 0.10, jitter_component),
        ("failure", 0.15, failure_component),
        ("trend", 0.10, worsening_trend),
    ];

    let unstable = features.success_rate < 0.8 || features.latency_std > 50.0;
    if unstable {
        for (name, weight, _) in weights.iter_mut() {
            if *name == "volatility" || *name == "jitter" {
                *weight *= 1.8;
            }
        }
    }

    let weight_sum: f64 = weights.iter().map(|(_, w, _)| w).sum();
    weights.iter().map(|(_, w, v)| w * v).sum::<f64>() / weight_sum
}

/// Possible score adjustments (spec §4.7).
pub const ADJUSTMENT_STRONG_BONUS: f64 = 5.0;
pub const ADJUSTMENT_MILD_BONUS: f64 = 2.0;
pub const ADJUSTMENT_NONE: f64 = 0.0;
pub const ADJUSTMENT_PENALTY: f64 = -3.0;
pub const ADJUSTMENT_FAILURE_PENALTY: f64 = -10.0;

/// Compute the post-request score adjustment. `latest_outcome_failed`
/// short-circuits to the fixed failure penalty regardless of the
/// computed risk (spec §4.7: "fail -> -10").
#[must_use]
pub fn predictive_adjustment(window: &[Sample], recent_quality: f64, latest_outcome_failed: bool, tuning: &Tuning) -> f64 {
    if latest_outcome_failed {
        return ADJUSTMENT_FAILURE_PENALTY;
    }
    if window.len() < tuning.min_samples_for_prediction {
        return ADJUSTMENT_NONE;
    }
    let features = extract_features(window, recent_quality);
    let r = risk(&features, tuning);
    if r < 0.3 {
        ADJUSTMENT_STRONG_BONUS
    } else if r < 0.5 {
        ADJUSTMENT_MILD_BONUS
    } else if r > 0.7 {
        ADJUSTMENT_PENALTY
    } else {
        ADJUSTMENT_NONE
    }
}
