//! Endpoint Registry (spec §4.8): the sole writer of endpoint mutable
//! fields. Readers obtain atomic snapshots (cloned `Endpoint`s).

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Duration as ChronoDuration;

use crate::config::{EndpointConfig, Tuning};
use crate::models::Endpoint;
use crate::time_utils::TimeUtils;

/// Staleness cleanup thresholds (spec §4.8).
pub const STALE_AFTER_HOURS: i64 = 3;
pub const LOW_WATER_SCORE: f64 = 20.0;

/// Owns all `Endpoint` objects and the "current" endpoint pointer.
pub struct EndpointRegistry {
    endpoints: RwLock<HashMap<String, Endpoint>>,
    current: RwLock<Option<String>>,
}

impl EndpointRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoints: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
        }
    }

    /// Load endpoints from configuration. Invalid entries are rejected and
    /// skipped (spec §7: Input error — reject the endpoint, continue).
    #[must_use]
    pub fn from_configs(configs: &[EndpointConfig]) -> Self {
        let registry = Self::new();
        for cfg in configs {
            let Ok((host, port)) = cfg.host_port() else {
                tracing::warn!(endpoint = %cfg.id, "rejecting endpoint with malformed server address");
                continue;
            };
            let mut endpoint = Endpoint::new(cfg.id.clone(), cfg.name.clone(), host, port, cfg.r#type.clone());
            if let Some(url) = &cfg.probe_url {
                endpoint = endpoint.with_probe_url(url.clone());
            }
            if !endpoint.is_valid() {
                tracing::warn!(endpoint = %cfg.id, "rejecting invalid endpoint");
                continue;
            }
            registry.insert(endpoint);
        }
        registry
    }

    pub fn insert(&self, endpoint: Endpoint) {
        let mut endpoints = self.endpoints.write().unwrap();
        endpoints.insert(endpoint.id.clone(), endpoint);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Endpoint> {
        self.endpoints.read().unwrap().get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.endpoints.read().unwrap().contains_key(id)
    }

    #[must_use]
    pub fn all(&self) -> Vec<Endpoint> {
        self.endpoints.read().unwrap().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a clamped delta to an endpoint's quality EMA.
    pub fn update_quality(&self, id: &str, delta: f64) {
        let mut endpoints = self.endpoints.write().unwrap();
        if let Some(endpoint) = endpoints.get_mut(id) {
            endpoint.update_quality(delta);
        }
    }

    /// Cooldown duration grows with quality: higher-quality endpoints are
    /// held longer between forced re-selections (spec §4.8).
    #[must_use]
    pub fn cooldown_duration_for_score(score: f64, tuning: &Tuning) -> ChronoDuration {
        let base = tuning.cooldown_base_minutes as f64;
        let scaled = base * (1.0 + (score / 100.0) * 0.9);
        let bounded = scaled.clamp(tuning.cooldown_min_minutes as f64, tuning.cooldown_max_minutes as f64);
        ChronoDuration::minutes(bounded.round() as i64)
    }

    /// Extend an endpoint's cooldown using the quality-scaled duration.
    pub fn set_cooldown(&self, id: &str, tuning: &Tuning) {
        let mut endpoints = self.endpoints.write().unwrap();
        if let Some(endpoint) = endpoints.get_mut(id) {
            let duration = Self::cooldown_duration_for_score(endpoint.quality, tuning);
            endpoint.extend_cooldown(duration);
        }
    }

    /// Emergency failover: clear cooldown explicitly, bypassing the
    /// monotonic-extend rule.
    pub fn clear_cooldown(&self, id: &str) {
        let mut endpoints = self.endpoints.write().unwrap();
        if let Some(endpoint) = endpoints.get_mut(id) {
            endpoint.clear_cooldown();
        }
    }

    #[must_use]
    pub fn current_endpoint(&self) -> Option<String> {
        self.current.read().unwrap().clone()
    }

    pub fn set_current(&self, id: &str) {
        *self.current.write().unwrap() = Some(id.to_string());
    }

    /// Periodic-free cleanup pass (spec §4.8): invoked by the Orchestrator
    /// on evaluation completion, not on a timer. Removes endpoints whose
    /// last evaluation is older than `STALE_AFTER_HOURS` or whose score is
    /// below `LOW_WATER_SCORE`. Returns the removed endpoint ids.
    pub fn cleanup_stale(&self) -> Vec<String> {
        let mut endpoints = self.endpoints.write().unwrap();
        let now = TimeUtils::now();
        let mut removed = Vec::new();
        endpoints.retain(|id, endpoint| {
            let stale_by_age = (now - endpoint.last_evaluated) > ChronoDuration::hours(STALE_AFTER_HOURS);
            let stale_by_score = endpoint.quality < LOW_WATER_SCORE;
            let keep = !(stale_by_age || stale_by_score);
            if !keep {
                removed.push(id.clone());
            }
            keep
        });
        removed
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(id: &str) -> EndpointConfig {
        EndpointConfig {
            id: id.to_string(),
            name: id.to_string(),
            server: "example.com:8080".to_string(),
            probe_url: None,
            r#type: "http".to_string(),
        }
    }

    #[test]
    fn invalid_endpoint_is_rejected_but_others_load() {
        let mut bad = cfg("bad");
        bad.server = "no-port".to_string();
        let registry = EndpointRegistry::from_configs(&[cfg("good"), bad]);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("good"));
        assert!(!registry.contains("bad"));
    }

    #[test]
    fn cooldown_duration_is_bounded() {
        let tuning = Tuning::default();
        let low = EndpointRegistry::cooldown_duration_for_score(0.0, &tuning);
        let high = EndpointRegistry::cooldown_duration_for_score(100.0, &tuning);
        assert!(low.num_minutes() >= tuning.cooldown_min_minutes);
        assert!(high.num_minutes() <= tuning.cooldown_max_minutes);
        assert!(high > low, "higher quality should earn a longer cooldown");
    }

    #[test]
    fn cleanup_removes_low_quality_endpoints() {
        let registry = EndpointRegistry::from_configs(&[cfg("low"), cfg("high")]);
        registry.update_quality("low", -40.0); // 50 -> 10, below low-water mark
        registry.update_quality("high", 10.0); // 50 -> 60
        let removed = registry.cleanup_stale();
        assert_eq!(removed, vec!["low".to_string()]);
        assert!(registry.contains("high"));
    }

    #[test]
    fn clear_cooldown_overrides_monotonic_extension() {
        let registry = EndpointRegistry::from_configs(&[cfg("a")]);
        registry.set_cooldown("a", &Tuning::default());
        assert!(registry.get("a").unwrap().is_in_cooldown());
        registry.clear_cooldown("a");
        assert!(!registry.get("a").unwrap().is_in_cooldown());
    }
}
