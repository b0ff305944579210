//! Probe Engine (spec §4.5): TCP connect + HTTP GET against an endpoint,
//! emitting a `Sample`. Retries with exponential backoff; falls back to a
//! simulated sample after retries are exhausted.

use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::Client;
use tokio::net::TcpStream;
use tokio::time::timeout as tokio_timeout;

use crate::models::{Endpoint, Sample};
use crate::store::LruTtlCache;

/// Backoff starting point and ceiling (spec §4.5).
const BACKOFF_START_MS: u64 = 200;
const BACKOFF_CAP_MS: u64 = 5000;

/// Probe result cache TTL (spec §4.5: "cached for 60s").
const PROBE_CACHE_TTL_SECS: u64 = 60;

/// Cap on bytes read from a probe response body (spec §4.5: "up to 64 KiB").
const MAX_PROBE_BODY_BYTES: usize = 64 * 1024;

/// Probes endpoints and emits `Sample`s, honouring a per-endpoint result
/// cache and bounded retries with exponential backoff.
pub struct ProbeEngine {
    client: Client,
    timeout: Duration,
    retry_count: usize,
    cache: LruTtlCache<String, Sample>,
}

impl ProbeEngine {
    #[must_use]
    pub fn new(timeout: Duration, retry_count: usize, user_agent: &str) -> Self {
        let client = Client::builder().timeout(timeout).user_agent(user_agent.to_string()).build().unwrap_or_default();
        Self {
            client,
            timeout,
            retry_count,
            cache: LruTtlCache::new(256),
        }
    }

    /// Probe `endpoint`, consulting the 60s result cache first.
    pub async fn probe(&self, endpoint: &Endpoint) -> Sample {
        if let Some(cached) = self.cache.get(&endpoint.id) {
            return cached;
        }

        let sample = self.probe_uncached(endpoint).await;
        self.cache.set(endpoint.id.clone(), sample.clone(), Duration::from_secs(PROBE_CACHE_TTL_SECS));
        sample
    }

    async fn probe_uncached(&self, endpoint: &Endpoint) -> Sample {
        let mut backoff = Duration::from_millis(BACKOFF_START_MS);
        let attempts = 1 + self.retry_count;

        for attempt in 0..attempts {
            if let Some(sample) = self.attempt(endpoint).await {
                return sample;
            }
            if attempt + 1 < attempts {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_millis(BACKOFF_CAP_MS));
            }
        }

        tracing::warn!(endpoint = %endpoint.id, "probe failed after retries, emitting simulated sample");
        simulated_sample()
    }

    /// One probe attempt: TCP connect (best-effort, does not abort the
    /// probe on its own failure) followed by an HTTP GET. Returns `None` on
    /// transport failure so the caller can retry; the final retry's
    /// failure is converted into a hard-failure sample by the caller's
    /// retry loop falling through to the simulated path, matching spec
    /// §4.5 step 4 ("after all retries, emit a simulated sample").
    async fn attempt(&self, endpoint: &Endpoint) -> Option<Sample> {
        let connect_latency = self.tcp_connect_latency(endpoint).await;

        let url = endpoint.probe_url.clone().unwrap_or_else(|| format!("http://{}/", endpoint.address()));
        let started = Instant::now();
        let response = tokio_timeout(self.timeout, self.client.get(&url).send()).await;

        match response {
            Ok(Ok(resp)) => {
                let bytes = match tokio_timeout(self.timeout, resp.bytes()).await {
                    Ok(Ok(body)) => body.len().min(MAX_PROBE_BODY_BYTES) as u64,
                    _ => 0,
                };
                let elapsed = started.elapsed();
                let http_latency = elapsed.as_secs_f64() * 1000.0;
                let latency = connect_latency.map_or(http_latency, |l| l.min(http_latency));

                let kb_per_sec = if elapsed.as_secs_f64() > 0.0 { (bytes as f64 / 1024.0) / elapsed.as_secs_f64() } else { 0.0 };
                let jitter = (200.0 - kb_per_sec / 10.0).clamp(0.0, crate::models::sample::JITTER_CAP);

                let bps = if elapsed.as_secs_f64() > 0.0 { bytes as f64 * 8.0 / elapsed.as_secs_f64() } else { 0.0 };

                Some(Sample::success(latency, jitter, 0.0, bytes, bps))
            }
            _ => None,
        }
    }

    /// Best-effort TCP connect latency measurement. Failure here does not
    /// terminate the probe (spec §4.5 step 1).
    async fn tcp_connect_latency(&self, endpoint: &Endpoint) -> Option<f64> {
        let started = Instant::now();
        match tokio_timeout(self.timeout, TcpStream::connect(endpoint.address())).await {
            Ok(Ok(_stream)) => Some(started.elapsed().as_secs_f64() * 1000.0),
            _ => None,
        }
    }
}

/// Build a hard-failure sample for a fully exhausted attempt (used by
/// callers that need the terminal hard-failure shape independent of the
/// retry loop above, e.g. direct unit tests).
#[must_use]
pub fn hard_failure_sample(timeout: Duration) -> Sample {
    Sample::hard_failure(timeout.as_secs_f64() * 1000.0)
}

/// A plausible simulated sample, flagged so it never counts toward
/// availability (spec §4.5 step 4).
fn simulated_sample() -> Sample {
    let mut rng = rand::thread_rng();
    let latency = rng.gen_range(50.0..1500.0);
    let jitter = rng.gen_range(0.0..100.0);
    let loss = rng.gen_range(0.0..0.2);
    let bps = rng.gen_range(1e5..1e7);
    Sample::simulated(latency, jitter, loss, bps)
}
