//! A single probe/request outcome — the atomic unit of measurement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::TimeUtils;

/// Upper bound on jitter scores/estimates (ms); see spec §4.5, §9.
pub const JITTER_CAP: f64 = 500.0;

/// One probe or request outcome recorded against an endpoint.
///
/// `hardFail=true` means the probe never completed a transport handshake
/// (connect refused, timeout, TLS failure) — distinct from a successful
/// probe that merely reported poor numbers. `simulated=true` flags a
/// fallback sample built from plausible random values after repeated probe
/// failures; it must never count as a success for availability purposes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub latency_ms: f64,
    pub jitter_ms: f64,
    pub loss_rate: f64,
    pub bytes: u64,
    pub bps: f64,
    pub success: bool,
    pub hard_fail: bool,
    pub simulated: bool,
}

impl Sample {
    /// Build a successful sample from measured values.
    #[must_use]
    pub fn success(latency_ms: f64, jitter_ms: f64, loss_rate: f64, bytes: u64, bps: f64) -> Self {
        Self {
            timestamp: TimeUtils::now(),
            latency_ms,
            jitter_ms: jitter_ms.clamp(0.0, JITTER_CAP),
            loss_rate: loss_rate.clamp(0.0, 1.0),
            bytes,
            bps: bps.max(0.0),
            success: true,
            hard_fail: false,
            simulated: false,
        }
    }

    /// Build a hard-failure sample: probe could not complete a transport
    /// handshake. Per spec §4.5 step 2, `latency=timeout`, `loss=1`,
    /// `jitter=JITTER_CAP`, `bytes=0`, `bps=0`.
    #[must_use]
    pub fn hard_failure(timeout_ms: f64) -> Self {
        Self {
            timestamp: TimeUtils::now(),
            latency_ms: timeout_ms,
            jitter_ms: JITTER_CAP,
            loss_rate: 1.0,
            bytes: 0,
            bps: 0.0,
            success: false,
            hard_fail: true,
            simulated: false,
        }
    }

    /// Build a simulated sample emitted after retries are exhausted. Must be
    /// flagged `simulated` and must never count as a success.
    #[must_use]
    pub fn simulated(latency_ms: f64, jitter_ms: f64, loss_rate: f64, bps: f64) -> Self {
        Self {
            timestamp: TimeUtils::now(),
            latency_ms,
            jitter_ms: jitter_ms.clamp(0.0, JITTER_CAP),
            loss_rate: loss_rate.clamp(0.0, 1.0),
            bytes: 0,
            bps: bps.max(0.0),
            success: false,
            hard_fail: false,
            simulated: true,
        }
    }

    /// Build a sample describing a completed request outcome (Outcome
    /// Recorder input), rather than a synthetic probe.
    #[must_use]
    pub fn from_outcome(latency_ms: f64, bytes: u64, success: bool, hard_fail: bool) -> Self {
        Self {
            timestamp: TimeUtils::now(),
            latency_ms,
            jitter_ms: 0.0,
            loss_rate: if success { 0.0 } else { 1.0 },
            bytes,
            bps: if latency_ms > 0.0 {
                bytes as f64 / (latency_ms / 1000.0)
            } else {
                0.0
            },
            success,
            hard_fail,
            simulated: false,
        }
    }

    /// `true` if this sample should count as a success for availability
    /// purposes. Simulated samples never count as success.
    #[must_use]
    pub const fn counts_as_success(&self) -> bool {
        self.success && !self.simulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_failure_has_expected_shape() {
        let s = Sample::hard_failure(5000.0);
        assert!(s.hard_fail);
        assert!(!s.success);
        assert_eq!(s.loss_rate, 1.0);
        assert_eq!(s.jitter_ms, JITTER_CAP);
        assert_eq!(s.bytes, 0);
    }

    #[test]
    fn simulated_never_counts_as_success() {
        let s = Sample::simulated(100.0, 10.0, 0.0, 1e6);
        assert!(s.simulated);
        assert!(!s.counts_as_success());
    }

    #[test]
    fn successful_sample_counts() {
        let s = Sample::success(50.0, 5.0, 0.0, 1024, 2e6);
        assert!(s.counts_as_success());
    }
}
