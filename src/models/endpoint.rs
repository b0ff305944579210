//! Endpoint: a configured outbound proxy candidate with stable identity and
//! mutable reputation state (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::GeoTag;
use crate::time_utils::TimeUtils;

/// History capacity: bounded to 100 (quality, timestamp) records (spec §3).
pub const HISTORY_CAPACITY: usize = 100;

/// Quality EMA bounds (spec §3 invariants).
pub const QUALITY_MIN: f64 = 0.0;
pub const QUALITY_MAX: f64 = 100.0;

/// A configured outbound proxy candidate.
///
/// Owned by the Endpoint Registry; mutated only by the Quality Scorer, the
/// Outcome Recorder, and the Selector (cooldown). `history` and `quality`
/// are the Registry's write surface; everything else is set at config load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub probe_url: Option<String>,

    /// Quality EMA, always clamped to `[0, 100]`.
    pub quality: f64,
    /// Bounded (timestamp, score) history, FIFO-evicted at `HISTORY_CAPACITY`.
    pub history: Vec<(DateTime<Utc>, f64)>,
    /// Cooldown expiry; `None` means not in cooldown.
    pub cooldown_until: Option<DateTime<Utc>>,
    /// Cached geo tag, if resolved.
    pub geo: Option<GeoTag>,
    pub last_evaluated: DateTime<Utc>,
}

impl Endpoint {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, host: impl Into<String>, port: u16, protocol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            host: host.into(),
            port,
            protocol: protocol.into(),
            probe_url: None,
            quality: 50.0,
            history: Vec::new(),
            cooldown_until: None,
            geo: None,
            last_evaluated: TimeUtils::now(),
        }
    }

    #[must_use]
    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }

    /// Basic input validation performed at config load (spec §7: Input
    /// error — reject the endpoint, continue with the rest).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.host.is_empty() && self.port > 0
    }

    /// `"host:port"`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply a bounded delta to the quality EMA, clamping both the delta
    /// (±20) and the resulting value (`[0, 100]`). Records a history entry.
    pub fn update_quality(&mut self, delta: f64) {
        let clamped_delta = delta.clamp(-20.0, 20.0);
        self.quality = (self.quality + clamped_delta).clamp(QUALITY_MIN, QUALITY_MAX);
        self.push_history(self.quality);
        self.last_evaluated = TimeUtils::now();
    }

    fn push_history(&mut self, score: f64) {
        if self.history.len() >= HISTORY_CAPACITY {
            self.history.remove(0);
        }
        self.history.push((TimeUtils::now(), score));
    }

    #[must_use]
    pub fn is_in_cooldown(&self) -> bool {
        match self.cooldown_until {
            Some(until) => TimeUtils::now() < until,
            None => false,
        }
    }

    /// Extend cooldown monotonically: a new assignment can only push the
    /// expiry later, never earlier (spec §3 invariant).
    pub fn extend_cooldown(&mut self, duration: chrono::Duration) {
        let candidate = TimeUtils::now() + duration;
        self.cooldown_until = Some(match self.cooldown_until {
            Some(existing) if existing > candidate => existing,
            _ => candidate,
        });
    }

    /// Emergency failover clears cooldown explicitly, bypassing the
    /// monotonic-extend rule.
    pub fn clear_cooldown(&mut self) {
        self.cooldown_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::new("a", "Alpha", "proxy.example.com", 8080, "http")
    }

    #[test]
    fn quality_update_is_clamped_both_ways() {
        let mut e = endpoint();
        e.quality = 95.0;
        e.update_quality(50.0); // delta clamped to +20 -> 100, then clamp to 100
        assert_eq!(e.quality, 100.0);

        e.quality = 5.0;
        e.update_quality(-50.0); // delta clamped to -20 -> -15, then clamp to 0
        assert_eq!(e.quality, 0.0);
    }

    #[test]
    fn history_is_bounded() {
        let mut e = endpoint();
        for _ in 0..(HISTORY_CAPACITY + 10) {
            e.update_quality(1.0);
        }
        assert_eq!(e.history.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn cooldown_extension_is_monotonic() {
        let mut e = endpoint();
        e.extend_cooldown(chrono::Duration::minutes(30));
        let first = e.cooldown_until.unwrap();
        e.extend_cooldown(chrono::Duration::minutes(5));
        // A shorter extension must not move the expiry earlier.
        assert!(e.cooldown_until.unwrap() >= first);
    }

    #[test]
    fn clear_cooldown_bypasses_monotonic_rule() {
        let mut e = endpoint();
        e.extend_cooldown(chrono::Duration::hours(1));
        e.clear_cooldown();
        assert!(!e.is_in_cooldown());
    }

    #[test]
    fn invalid_endpoint_is_detected() {
        let mut e = endpoint();
        e.host.clear();
        assert!(!e.is_valid());
    }
}
