//! Sample Store (spec §4.1): a bounded rolling window of probe/outcome
//! samples per endpoint. Writes are O(1); reads expose the window as
//! projected arrays for the Predictive Scorer.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::models::Sample;

/// Ring buffer capacity per endpoint (spec §3, `W=50`).
pub const DEFAULT_CAPACITY: usize = 50;

/// Per-endpoint bounded ring buffer of samples, keyed by endpoint id.
///
/// Endpoints are independent, concurrently-accessed keys, so the windows
/// live in a `DashMap` (internally sharded) rather than one global
/// `RwLock<HashMap<_>>` — one endpoint's write never blocks another
/// endpoint's reads or writes.
pub struct SampleStore {
    capacity: usize,
    windows: DashMap<String, Vec<Sample>>,
}

impl SampleStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: DashMap::new(),
        }
    }

    /// Append a sample for `endpoint_id`, evicting the oldest entry (FIFO)
    /// if the window is at capacity.
    pub fn append(&self, endpoint_id: &str, sample: Sample) {
        let mut window = self.windows.entry(endpoint_id.to_string()).or_insert_with(Vec::new);
        if window.len() >= self.capacity {
            window.remove(0);
        }
        window.push(sample);
    }

    /// Last `n` samples, oldest first.
    #[must_use]
    pub fn last_n(&self, endpoint_id: &str, n: usize) -> Vec<Sample> {
        match self.windows.get(endpoint_id) {
            Some(window) => {
                let start = window.len().saturating_sub(n);
                window[start..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// The entire window, oldest first.
    #[must_use]
    pub fn window(&self, endpoint_id: &str) -> Vec<Sample> {
        self.last_n(endpoint_id, self.capacity)
    }

    #[must_use]
    pub fn latest(&self, endpoint_id: &str) -> Option<Sample> {
        self.windows.get(endpoint_id).and_then(|w| w.last().cloned())
    }

    #[must_use]
    pub fn len(&self, endpoint_id: &str) -> usize {
        self.windows.get(endpoint_id).map_or(0, |w| w.len())
    }

    #[must_use]
    pub fn is_empty(&self, endpoint_id: &str) -> bool {
        self.len(endpoint_id) == 0
    }

    /// Latencies in window order (oldest first).
    #[must_use]
    pub fn latencies(&self, endpoint_id: &str) -> Vec<f64> {
        self.window(endpoint_id).iter().map(|s| s.latency_ms).collect()
    }

    #[must_use]
    pub fn losses(&self, endpoint_id: &str) -> Vec<f64> {
        self.window(endpoint_id).iter().map(|s| s.loss_rate).collect()
    }

    #[must_use]
    pub fn jitters(&self, endpoint_id: &str) -> Vec<f64> {
        self.window(endpoint_id).iter().map(|s| s.jitter_ms).collect()
    }

    #[must_use]
    pub fn bps_series(&self, endpoint_id: &str) -> Vec<f64> {
        self.window(endpoint_id).iter().map(|s| s.bps).collect()
    }

    /// Success-as-0/1 projection, in window order.
    #[must_use]
    pub fn success_flags(&self, endpoint_id: &str) -> Vec<f64> {
        self.window(endpoint_id)
            .iter()
            .map(|s| if s.counts_as_success() { 1.0 } else { 0.0 })
            .collect()
    }

    /// Replace an endpoint's window wholesale (used to restore a persisted
    /// snapshot). Truncates to `capacity` if the loaded window is larger.
    pub fn restore(&self, endpoint_id: &str, mut samples: Vec<Sample>) {
        if samples.len() > self.capacity {
            let excess = samples.len() - self.capacity;
            samples.drain(0..excess);
        }
        self.windows.insert(endpoint_id.to_string(), samples);
    }

    /// Snapshot all windows for persistence.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Vec<Sample>> {
        self.windows.iter().map(|entry| (entry.key().clone(), entry.value().clone())).collect()
    }
}
