//! Scheduler configuration management.
//!
//! Handles loading configuration from multiple layered sources: built-in
//! defaults, an optional config file, then environment variables (highest
//! precedence).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SchedulerError};
use crate::models::RegionRule;

/// One configured outbound proxy candidate, as read from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub id: String,
    pub name: String,
    /// `"host:port"`.
    pub server: String,
    #[serde(default)]
    pub probe_url: Option<String>,
    #[serde(default = "default_endpoint_type")]
    pub r#type: String,
}

fn default_endpoint_type() -> String {
    "http".to_string()
}

impl EndpointConfig {
    /// Split `server` into `(host, port)`. Per spec §7 (Input error), a
    /// malformed server string is rejected at load rather than panicking.
    pub fn host_port(&self) -> Result<(String, u16)> {
        let (host, port_str) = self
            .server
            .rsplit_once(':')
            .ok_or_else(|| SchedulerError::invalid_endpoint_config(format!("'{}' is not host:port", self.server)))?;
        let port: u16 = port_str
            .parse()
            .map_err(|_| SchedulerError::invalid_endpoint_config(format!("invalid port in '{}'", self.server)))?;
        if host.is_empty() || port == 0 {
            return Err(SchedulerError::invalid_endpoint_config(format!(
                "'{}' has an empty host or zero port",
                self.server
            )));
        }
        Ok((host.to_string(), port))
    }
}

/// Tuning knobs referenced throughout §4 and §6 of the spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Sample Store ring-buffer capacity per endpoint (spec §4.1, `W=50`).
    pub sample_window: usize,
    /// Fan-out concurrency limit for preheat/evaluation (spec §5, default 3).
    pub concurrency_limit: usize,
    /// Additional probe retry attempts (spec §4.5, default 2).
    pub retry_count: usize,
    /// Selector utility weights `(quality, metric, success)` (spec §4.9).
    pub weight_quality: f64,
    pub weight_metric: f64,
    pub weight_success: f64,
    /// Cooldown floor/ceiling/base (spec §4.8).
    pub cooldown_min_minutes: i64,
    pub cooldown_max_minutes: i64,
    pub cooldown_base_minutes: i64,
    /// Availability minimum rate before the `availabilityBias` penalty
    /// kicks in (spec §4.9, default 0.75).
    pub availability_min_rate: f64,
    /// Hard-fail streak that triggers emergency failover (spec §4.11, default 2).
    pub emergency_hard_fail_count: u32,
    /// Thresholds (spec §6).
    pub latency_cap_ms: f64,
    pub jitter_cap_ms: f64,
    pub loss_cap: f64,
    pub bps_soft_cap: f64,
    pub throughput_score_cap: f64,
    /// Decision cache size/TTL (spec §3).
    pub decision_cache_capacity: usize,
    pub decision_cache_ttl_secs: u64,
    /// Geo cache TTL for fallback entries (spec §3, default 1h).
    pub geo_cache_fallback_ttl_secs: u64,
    /// Minimum samples before the Predictive Scorer runs (spec §4.7).
    pub min_samples_for_prediction: usize,
    /// Number of endpoints preheated at startup (spec §4.12, default 10).
    pub preheat_count: usize,
    /// Large-payload threshold in bytes (spec §4.10, default 512 KiB).
    pub large_payload_bytes: u64,
    /// Destination ports treated as gaming traffic (spec §4.10).
    pub gaming_ports: Vec<u16>,
    /// Video/AI classification regexes, matched against URL/headers.
    pub video_hint_pattern: String,
    pub ai_hint_pattern: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            sample_window: 50,
            concurrency_limit: 3,
            retry_count: 2,
            weight_quality: 0.5,
            weight_metric: 0.35,
            weight_success: 0.15,
            cooldown_min_minutes: 5,
            cooldown_max_minutes: 120,
            cooldown_base_minutes: 30,
            availability_min_rate: 0.75,
            emergency_hard_fail_count: 2,
            latency_cap_ms: 3000.0,
            jitter_cap_ms: 500.0,
            loss_cap: 1.0,
            bps_soft_cap: 50_000_000.0,
            throughput_score_cap: 15.0,
            decision_cache_capacity: 1000,
            decision_cache_ttl_secs: 3600,
            geo_cache_fallback_ttl_secs: 3600,
            min_samples_for_prediction: 5,
            preheat_count: 10,
            large_payload_bytes: 512 * 1024,
            gaming_ports: vec![3074, 3478, 3479, 3480, 27015, 27016, 6112],
            video_hint_pattern: r"video/|\.m3u8|\.mp4|youtube\.|netflix\.|twitch\.".to_string(),
            ai_hint_pattern: r"openai\.com|anthropic\.com|api\.cohere|huggingface\.co".to_string(),
        }
    }
}

/// Full scheduler configuration: endpoints, tuning, and the region table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub regions: Vec<RegionRule>,
    /// When `true`, the Dispatcher never falls back to `direct` mode (spec
    /// §7: "the core never refuses to produce a decision ... unless the
    /// host disabled the direct fallback explicitly").
    #[serde(default)]
    pub disable_direct_fallback: bool,
    /// When `true`, no external geo/DNS lookups are performed; geography is
    /// resolved purely from TLD heuristics (spec §1, §4.10).
    #[serde(default)]
    pub geo_external_lookup_disabled: bool,
    /// Path to the persistence snapshot file (spec §6). `None` disables
    /// persistence entirely.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    #[serde(with = "humantime_serde", default = "default_probe_timeout")]
    pub probe_timeout: Duration,
    pub verbose: bool,
}

fn default_probe_timeout() -> Duration {
    Duration::from_millis(5000)
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            tuning: Tuning::default(),
            regions: Vec::new(),
            disable_direct_fallback: false,
            geo_external_lookup_disabled: false,
            snapshot_path: None,
            probe_timeout: default_probe_timeout(),
            verbose: false,
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (`PROXY_SCHEDULER_*`)
    /// 2. Config file (`~/.config/adaptive-proxy-scheduler/config.toml`)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self> {
        let defaults_toml = toml::to_string(&Self::default())
            .map_err(|e| SchedulerError::config(format!("failed to serialize defaults: {e}")))?;

        let mut builder = Config::builder().add_source(File::from_str(&defaults_toml, config::FileFormat::Toml));

        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                builder = builder.add_source(File::from(config_path));
            }
        }

        builder = builder.add_source(Environment::with_prefix("PROXY_SCHEDULER").separator("__"));

        builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| SchedulerError::config(format!("failed to load configuration: {e}")))
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("adaptive-proxy-scheduler");
            path.push("config.toml");
            path
        })
    }

    /// Persist configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path().ok_or_else(|| SchedulerError::config("cannot determine config directory"))?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self).map_err(|e| SchedulerError::config(format!("failed to serialize config: {e}")))?;
        std::fs::write(&config_path, toml_string)?;
        Ok(())
    }

    /// Validate configuration constraints. Surfaces at startup (spec §7);
    /// on reload the caller is expected to log-and-keep-old instead.
    pub fn validate(&self) -> Result<()> {
        if self.tuning.concurrency_limit == 0 {
            return Err(SchedulerError::validation("concurrency_limit", "must be greater than 0"));
        }
        if self.tuning.sample_window == 0 {
            return Err(SchedulerError::validation("sample_window", "must be greater than 0"));
        }
        if self.tuning.cooldown_min_minutes > self.tuning.cooldown_max_minutes {
            return Err(SchedulerError::validation("cooldown_min_minutes", "must not exceed cooldown_max_minutes"));
        }
        let weight_sum = self.tuning.weight_quality + self.tuning.weight_metric + self.tuning.weight_success;
        if weight_sum <= 0.0 {
            return Err(SchedulerError::validation("weight_*", "selector weights must sum to a positive value"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SchedulerConfig::default().validate().unwrap();
    }

    #[test]
    fn host_port_splits_correctly() {
        let ep = EndpointConfig {
            id: "a".into(),
            name: "Alpha".into(),
            server: "proxy.example.com:8080".into(),
            probe_url: None,
            r#type: "http".into(),
        };
        let (host, port) = ep.host_port().unwrap();
        assert_eq!(host, "proxy.example.com");
        assert_eq!(port, 8080);
    }

    #[test]
    fn malformed_server_is_rejected() {
        let ep = EndpointConfig {
            id: "a".into(),
            name: "Alpha".into(),
            server: "not-a-host-port".into(),
            probe_url: None,
            r#type: "http".into(),
        };
        assert!(ep.host_port().is_err());
    }

    #[test]
    fn invalid_cooldown_range_is_rejected() {
        let mut cfg = SchedulerConfig::default();
        cfg.tuning.cooldown_min_minutes = 200;
        cfg.tuning.cooldown_max_minutes = 10;
        assert!(cfg.validate().is_err());
    }
}
