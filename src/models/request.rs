//! Request-shaped types consumed by the Dispatcher (spec §4.10) and the
//! Outcome Recorder (spec §6): the inbound dispatch context, the derived
//! classification, the resulting decision, and the host's post-request
//! outcome report.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Endpoint, GeoTag};

/// Everything the Dispatcher is told about one outbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub client_ip: Option<String>,
    /// Explicit client-country override; bypasses IP/TLD resolution when set.
    pub client_country_hint: Option<String>,
    pub host: String,
    pub port: u16,
    /// `"tcp" | "udp" | "http" | "tls"`.
    pub protocol: String,
    pub payload_size_bytes: u64,
    /// Stable caller identity, part of the decision cache key.
    pub user_tag: Option<String>,
    /// URL or header content used for content-based classification
    /// (video/AI hint matching). Falls back to `host` when absent.
    pub url_hint: Option<String>,
}

/// Host → Outcome Recorder (Inbound), spec §6: what the host reports back
/// once a dispatched request has finished. The Outcome Recorder derives a
/// `Sample` from this (`Sample::from_outcome`) rather than requiring the
/// host to build one itself.
#[derive(Debug, Clone, Default)]
pub struct RequestOutcome {
    pub endpoint: String,
    pub success: bool,
    pub latency_ms: f64,
    pub bytes: u64,
    pub hard_fail: bool,
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub status: Option<u16>,
}

/// Derived request-class hints (spec §4.10 step 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub is_video: bool,
    pub is_ai: bool,
    pub is_large_payload: bool,
    pub is_gaming: bool,
    pub is_tls: bool,
    pub is_http: bool,
    /// `isVideo ∨ isLargePayload`.
    pub prefer_high_throughput: bool,
    /// `isGaming ∨ isAI ∨ isTLS`.
    pub prefer_low_latency: bool,
    /// `isAI ∨ isVideo`.
    pub prefer_stability: bool,
}

impl Classification {
    /// Derive the three preference flags from the base hints (spec §4.10
    /// step 1). Kept as a free function of the struct's own fields so the
    /// Dispatcher can't construct an inconsistent combination.
    #[must_use]
    pub fn with_preferences(mut self) -> Self {
        self.prefer_high_throughput = self.is_video || self.is_large_payload;
        self.prefer_low_latency = self.is_gaming || self.is_ai || self.is_tls;
        self.prefer_stability = self.is_ai || self.is_video;
        self
    }
}

/// Where a request should be sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DispatchMode {
    Proxy(Endpoint),
    Direct,
}

/// The Dispatcher's output for one request.
#[derive(Debug, Clone)]
pub struct Decision {
    pub mode: DispatchMode,
    pub classification: Classification,
    pub client_geo: GeoTag,
    pub target_geo: GeoTag,
    pub cache_hit: bool,
}

impl Decision {
    #[must_use]
    pub fn endpoint_id(&self) -> Option<&str> {
        match &self.mode {
            DispatchMode::Proxy(endpoint) => Some(&endpoint.id),
            DispatchMode::Direct => None,
        }
    }
}
