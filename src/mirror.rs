//! Mirror collaborator (SPEC_FULL.md "Mirror collaborator" section): a
//! narrow seam for a neighboring mirror-selection subsystem. This scheduler
//! does not implement mirror ranking itself — out of scope — but it does
//! own the single-flight memoization contract a caller of that subsystem is
//! expected to honour, so concurrent requests for the same key don't each
//! trigger a redundant lookup.

use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;

use crate::store::LruTtlCache;

/// Memoization window (spec: "10-minute TTL").
const MIRROR_TTL_SECS: u64 = 600;

/// Single-flight, TTL-memoized lookup of the best mirror for a key (e.g. a
/// package or region identifier). Never implements the selection policy
/// itself — `resolve` is the seam a real mirror-selection backend plugs
/// into.
pub struct MirrorSelector<F> {
    cache: LruTtlCache<String, String>,
    inflight: AsyncMutex<()>,
    resolve: F,
}

impl<F> MirrorSelector<F>
where
    F: Fn(&str) -> String,
{
    #[must_use]
    pub fn new(resolve: F) -> Self {
        Self {
            cache: LruTtlCache::new(256),
            inflight: AsyncMutex::new(()),
            resolve,
        }
    }

    /// Resolve the best mirror for `key`, memoized for 10 minutes.
    /// Concurrent callers for a key miss on the cache block on the same
    /// in-flight computation rather than duplicating it.
    pub async fn select_best_mirror(&self, key: &str) -> String {
        if let Some(hit) = self.cache.get(&key.to_string()) {
            return hit;
        }

        let _guard = self.inflight.lock().await;
        // Re-check: another caller may have finished the computation while
        // we waited for the lock.
        if let Some(hit) = self.cache.get(&key.to_string()) {
            return hit;
        }

        let mirror = (self.resolve)(key);
        self.cache.set(key.to_string(), mirror.clone(), Duration::from_secs(MIRROR_TTL_SECS));
        mirror
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn memoizes_within_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let selector = MirrorSelector::new(move |key: &str| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            format!("mirror-for-{key}")
        });

        let first = selector.select_best_mirror("pkg").await;
        let second = selector.select_best_mirror("pkg").await;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_resolve_independently() {
        let selector = MirrorSelector::new(|key: &str| format!("mirror-for-{key}"));
        assert_eq!(selector.select_best_mirror("a").await, "mirror-for-a");
        assert_eq!(selector.select_best_mirror("b").await, "mirror-for-b");
    }
}
