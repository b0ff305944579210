//! Dispatcher (spec §4.10): classifies a request, resolves its decision
//! cache key, ranks candidates by region preference and request-class bias,
//! and delegates the final pick to the Selector.

use std::time::Duration;

use regex::Regex;

use crate::config::{SchedulerConfig, Tuning};
use crate::error::{Result, SchedulerError};
use crate::geo::GeoResolver;
use crate::models::{Classification, Decision, DispatchMode, Endpoint, RequestContext};
use crate::registry::EndpointRegistry;
use crate::scoring::quality::metric_score;
use crate::selector::Selector;
use crate::store::{AvailabilityTracker, LruTtlCache, SampleStore};

/// Classifies requests and produces routing decisions.
pub struct Dispatcher {
    video_pattern: Regex,
    ai_pattern: Regex,
    decision_cache: LruTtlCache<(String, String, String), Option<String>>,
    decision_cache_ttl: Duration,
    disable_direct_fallback: bool,
}

impl Dispatcher {
    /// Build a Dispatcher from configuration. An invalid classification
    /// regex is an input error and is rejected at construction.
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        let video_pattern = Regex::new(&format!("(?i){}", config.tuning.video_hint_pattern))
            .map_err(|e| SchedulerError::config(format!("invalid video_hint_pattern: {e}")))?;
        let ai_pattern = Regex::new(&format!("(?i){}", config.tuning.ai_hint_pattern))
            .map_err(|e| SchedulerError::config(format!("invalid ai_hint_pattern: {e}")))?;

        Ok(Self {
            video_pattern,
            ai_pattern,
            decision_cache: LruTtlCache::new(config.tuning.decision_cache_capacity),
            decision_cache_ttl: Duration::from_secs(config.tuning.decision_cache_ttl_secs),
            disable_direct_fallback: config.disable_direct_fallback,
        })
    }

    /// Classify a request per spec §4.10 step 1. Content hints are matched
    /// against `url_hint`, falling back to `host`.
    #[must_use]
    pub fn classify(&self, ctx: &RequestContext, tuning: &Tuning) -> Classification {
        let haystack = ctx.url_hint.as_deref().unwrap_or(&ctx.host);
        Classification {
            is_video: self.video_pattern.is_match(haystack),
            is_ai: self.ai_pattern.is_match(haystack),
            is_large_payload: ctx.payload_size_bytes >= tuning.large_payload_bytes,
            is_gaming: tuning.gaming_ports.contains(&ctx.port),
            is_tls: ctx.protocol.eq_ignore_ascii_case("tls") || ctx.port == 443,
            is_http: ctx.protocol.eq_ignore_ascii_case("http") || ctx.port == 80 || ctx.port == 8080,
            ..Classification::default()
        }
        .with_preferences()
    }

    fn cache_key(ctx: &RequestContext, client_country: &str) -> (String, String, String) {
        (ctx.user_tag.clone().unwrap_or_default(), client_country.to_string(), ctx.host.clone())
    }

    /// Per-candidate bias derived from the request classification (spec
    /// §4.10 step 6). Higher is better; the Selector itself never sees
    /// these values, only the ordering they produce.
    ///
    /// `base` is the deterministic metric score of the endpoint's latest
    /// sample (0 with no sample yet); `availBonus` mirrors the Selector's
    /// availability bonus/penalty so a flaky endpoint never wins purely on
    /// request-class bias.
    fn bias(classification: &Classification, endpoint: &Endpoint, sample_store: &SampleStore, availability: &AvailabilityTracker, tuning: &Tuning) -> f64 {
        let avail_bonus = if availability.rate(&endpoint.id) >= 0.75 { 10.0 } else { -30.0 };
        let Some(sample) = sample_store.latest(&endpoint.id) else {
            return avail_bonus;
        };

        let base = metric_score(&sample, tuning);
        let throughput_bonus = if classification.prefer_high_throughput { ((sample.bps + 1.0).log10() * 2.0).round().min(10.0) } else { 0.0 };
        let latency_bonus = if classification.prefer_low_latency { (15.0 - sample.latency_ms / 30.0).clamp(0.0, 15.0) } else { 0.0 };
        let jitter_penalty = if classification.prefer_stability { (sample.jitter_ms / 50.0).round().min(10.0) } else { 0.0 };

        base + avail_bonus + throughput_bonus + latency_bonus - jitter_penalty
    }

    /// Decide where to send one request. `candidates` is the full
    /// registry snapshot; an empty set falls back to `Direct` unless the
    /// host disabled that fallback (spec §7).
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        &self,
        ctx: &RequestContext,
        candidates: &[Endpoint],
        registry: &EndpointRegistry,
        sample_store: &SampleStore,
        availability: &AvailabilityTracker,
        geo_resolver: &GeoResolver,
        region_table: &crate::models::RegionTable,
        tuning: &Tuning,
    ) -> Result<Decision> {
        let classification = self.classify(ctx, tuning);
        let client_geo = ctx
            .client_country_hint
            .as_ref()
            .map_or_else(|| geo_resolver.resolve_client(ctx.client_ip.as_deref(), Some(&ctx.host)), |country| crate::models::GeoTag::new(country));
        // Spec §4.10 step 3: targetGeo is resolved from the destination
        // host (DNS -> IP -> geo, or TLD fallback), independent of clientGeo.
        let target_geo = geo_resolver.resolve_target(&ctx.host);

        // Decision cache hit iff the stored id still exists AND is not in
        // cooldown (spec §8 testable property 7); a stale or cooled-down
        // entry falls through to a fresh selection below, which overwrites
        // the cache entry with its own result.
        let key = Self::cache_key(ctx, &client_geo.country);
        if let Some(cached_id) = self.decision_cache.get(&key) {
            let cached_endpoint = cached_id.as_ref().and_then(|id| registry.get(id));
            let still_valid = match (&cached_id, &cached_endpoint) {
                (None, _) => true,
                (Some(_), Some(endpoint)) => !endpoint.is_in_cooldown(),
                (Some(_), None) => false,
            };
            if still_valid {
                if let Some(endpoint) = &cached_endpoint {
                    registry.set_current(&endpoint.id);
                }
                let mode = cached_endpoint.map_or(DispatchMode::Direct, DispatchMode::Proxy);
                return Ok(Decision {
                    mode,
                    classification,
                    client_geo,
                    target_geo,
                    cache_hit: true,
                });
            }
        }

        if candidates.is_empty() {
            if self.disable_direct_fallback {
                return Err(SchedulerError::NoEndpoints);
            }
            self.decision_cache.set(key, None, self.decision_cache_ttl);
            return Ok(Decision {
                mode: DispatchMode::Direct,
                classification,
                client_geo,
                target_geo,
                cache_hit: false,
            });
        }

        let region_rule = region_table.first_match(&target_geo.country).or_else(|| region_table.first_match(&ctx.host));
        let (mut preferred, mut rest): (Vec<Endpoint>, Vec<Endpoint>) = (Vec::new(), Vec::new());
        for endpoint in candidates {
            let matches_region = region_rule.is_some_and(|rule| {
                endpoint.geo.as_ref().is_some_and(|g| g.country == target_geo.country) || endpoint.name.to_lowercase().contains(&rule.name.to_lowercase())
            });
            if matches_region {
                preferred.push(endpoint.clone());
            } else {
                rest.push(endpoint.clone());
            }
        }

        // `candidates` comes from a registry snapshot (HashMap-backed), so its
        // input order is not meaningful; break bias ties on quality, then id,
        // so the outcome never depends on iteration order.
        for group in [&mut preferred, &mut rest] {
            group.sort_by(|a, b| {
                Self::bias(&classification, b, sample_store, availability, tuning)
                    .partial_cmp(&Self::bias(&classification, a, sample_store, availability, tuning))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.quality.partial_cmp(&a.quality).unwrap_or(std::cmp::Ordering::Equal))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        preferred.extend(rest);

        let selector = Selector::new(sample_store, availability, tuning);
        let picked = selector.select_preserving_order(&preferred, None);

        let mode = match picked {
            Some(endpoint) => {
                self.decision_cache.set(key, Some(endpoint.id.clone()), self.decision_cache_ttl);
                registry.set_current(&endpoint.id);
                DispatchMode::Proxy(endpoint)
            }
            None if self.disable_direct_fallback => return Err(SchedulerError::NoEndpoints),
            None => {
                self.decision_cache.set(key, None, self.decision_cache_ttl);
                DispatchMode::Direct
            }
        };

        Ok(Decision {
            mode,
            classification,
            client_geo,
            target_geo,
            cache_hit: false,
        })
    }
}
