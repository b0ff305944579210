//! Pure rolling-statistics helpers used exclusively by the Predictive
//! Scorer (spec §4.2, §4.7). No mutable state lives here — callers project
//! a window of `Sample`s into `f64` arrays and feed them through these
//! functions.

use statistical::standard_deviation;

/// Default geometric decay factor: most-recent sample weighted heaviest.
pub const DEFAULT_DECAY: f64 = 0.9;

/// Weighted mean with geometric decay: the most recent element (last in
/// `values`) gets weight 1.0, the one before it `decay`, the one before
/// that `decay^2`, and so on.
#[must_use]
pub fn weighted_mean(values: &[f64], decay: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut weight = 1.0;
    let mut weight_sum = 0.0;
    let mut acc = 0.0;
    for &v in values.iter().rev() {
        acc += v * weight;
        weight_sum += weight;
        weight *= decay;
    }
    if weight_sum > 0.0 {
        acc / weight_sum
    } else {
        0.0
    }
}

/// Standard deviation of `values`, via the `statistical` crate (same one
/// the teacher uses for its `BasicStats`).
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    standard_deviation(values, None)
}

/// Coefficient of variation: `std_dev / mean`, 0 if mean is 0.
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean.abs() < f64::EPSILON {
        0.0
    } else {
        std_dev(values) / mean
    }
}

/// Percentile via sort-and-linear-interpolation (same shape as the
/// teacher's percentile helper, kept here as a pure stats primitive).
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    if values.len() == 1 {
        return values[0];
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper || upper >= sorted.len() {
        sorted[lower.min(sorted.len() - 1)]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Weighted linear trend (least squares over index 0..n with the same
/// geometric decay weighting as `weighted_mean`, recent samples weighted
/// higher). Returns the slope: positive means the series is increasing
/// over time.
#[must_use]
pub fn weighted_trend(values: &[f64], decay: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    // Weight index 0 (oldest) lowest, n-1 (newest) highest.
    let weights: Vec<f64> = (0..n).map(|i| decay.powi((n - 1 - i) as i32)).collect();
    let w_sum: f64 = weights.iter().sum();
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();

    let x_mean = xs.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>() / w_sum;
    let y_mean = values.iter().zip(&weights).map(|(y, w)| y * w).sum::<f64>() / w_sum;

    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..n {
        let dx = xs[i] - x_mean;
        let dy = values[i] - y_mean;
        num += weights[i] * dx * dy;
        den += weights[i] * dx * dx;
    }

    if den.abs() < f64::EPSILON {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_mean_favors_recent_values() {
        // All-equal values: weighted mean equals plain mean regardless of decay.
        assert!((weighted_mean(&[10.0, 10.0, 10.0], 0.9) - 10.0).abs() < 1e-9);

        // Recent (last) value dominates for a strong decay.
        let wm = weighted_mean(&[0.0, 0.0, 100.0], 0.1);
        assert!(wm > 90.0, "expected recent-heavy mean, got {wm}");
    }

    #[test]
    fn std_dev_of_constant_series_is_zero() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn percentile_matches_known_values() {
        let v = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 50.0), 3.0);
        assert_eq!(percentile(&v, 100.0), 5.0);
    }

    #[test]
    fn weighted_trend_detects_increasing_series() {
        let increasing = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(weighted_trend(&increasing, 0.9) > 0.0);

        let decreasing = vec![5.0, 4.0, 3.0, 2.0, 1.0];
        assert!(weighted_trend(&decreasing, 0.9) < 0.0);

        let flat = vec![3.0, 3.0, 3.0];
        assert!(weighted_trend(&flat, 0.9).abs() < 1e-9);
    }
}
