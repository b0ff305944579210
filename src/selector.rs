//! Selector (spec §4.9): ranks eligible endpoints by a composite utility,
//! applies cooldown and region-preference filtering. Oblivious to request
//! class — the Dispatcher layers request-class biases on top.

use crate::config::Tuning;
use crate::models::{Endpoint, GeoTag};
use crate::scoring::quality::metric_score;
use crate::store::{AvailabilityTracker, SampleStore};

/// Utility bonus/penalty applied based on success rate (spec §4.9).
const AVAILABILITY_BONUS: f64 = 10.0;
const AVAILABILITY_PENALTY: f64 = -30.0;
const AVAILABILITY_RATE_THRESHOLD: f64 = 0.75;

pub struct Selector<'a> {
    sample_store: &'a SampleStore,
    availability: &'a AvailabilityTracker,
    tuning: &'a Tuning,
}

impl<'a> Selector<'a> {
    #[must_use]
    pub fn new(sample_store: &'a SampleStore, availability: &'a AvailabilityTracker, tuning: &'a Tuning) -> Self {
        Self {
            sample_store,
            availability,
            tuning,
        }
    }

    /// Step 1+2 of spec §4.9: drop cooldown candidates (falling back to the
    /// unfiltered set if that empties it), then restrict to a geo-matching
    /// subset if one exists and is non-empty. Preserves input order.
    #[must_use]
    pub fn filter(&self, candidates: &[Endpoint], target_geo: Option<&GeoTag>) -> Vec<Endpoint> {
        let not_in_cooldown: Vec<Endpoint> = candidates.iter().filter(|e| !e.is_in_cooldown()).cloned().collect();
        let base = if not_in_cooldown.is_empty() { candidates.to_vec() } else { not_in_cooldown };

        if let Some(geo) = target_geo {
            if !geo.is_unknown() {
                let geo_matching: Vec<Endpoint> = base
                    .iter()
                    .filter(|e| e.geo.as_ref().is_some_and(|g| g.country == geo.country))
                    .cloned()
                    .collect();
                if !geo_matching.is_empty() {
                    return geo_matching;
                }
            }
        }
        base
    }

    fn utility(&self, endpoint: &Endpoint) -> f64 {
        let (quality_w, metric_w, success_w) = self.normalized_weights();
        let latest_metric = self
            .sample_store
            .latest(&endpoint.id)
            .map_or(0.0, |s| metric_score(&s, self.tuning));
        let rate = self.availability.rate(&endpoint.id);
        let availability_bias = if rate >= AVAILABILITY_RATE_THRESHOLD { AVAILABILITY_BONUS } else { AVAILABILITY_PENALTY };

        quality_w * endpoint.quality + metric_w * latest_metric + success_w * (rate * 100.0) + availability_bias
    }

    fn normalized_weights(&self) -> (f64, f64, f64) {
        let sum = self.tuning.weight_quality + self.tuning.weight_metric + self.tuning.weight_success;
        if sum <= 0.0 {
            return (0.5, 0.35, 0.15);
        }
        (self.tuning.weight_quality / sum, self.tuning.weight_metric / sum, self.tuning.weight_success / sum)
    }

    fn latest_latency(&self, endpoint: &Endpoint) -> f64 {
        self.sample_store.latest(&endpoint.id).map_or(f64::INFINITY, |s| s.latency_ms)
    }

    /// Full standalone ranking: filter then rank by utility with the spec's
    /// deterministic tie-break (higher quality, then lower latest latency,
    /// then id lexicographic order).
    #[must_use]
    pub fn select(&self, candidates: &[Endpoint], target_geo: Option<&GeoTag>) -> Option<Endpoint> {
        let filtered = self.filter(candidates, target_geo);
        self.rank(&filtered).into_iter().next()
    }

    /// Rank a filtered candidate set by utility, descending, with the
    /// spec's deterministic tie-break.
    #[must_use]
    pub fn rank(&self, filtered: &[Endpoint]) -> Vec<Endpoint> {
        let mut ranked = filtered.to_vec();
        ranked.sort_by(|a, b| {
            let ua = self.utility(a);
            let ub = self.utility(b);
            ub.partial_cmp(&ua)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.quality.partial_cmp(&a.quality).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| self.latest_latency(a).partial_cmp(&self.latest_latency(b)).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked
    }

    /// Used by the Dispatcher after it has already sorted candidates by
    /// request-class bias (spec §4.10 step 7): apply only cooldown/region
    /// filtering, preserving the Dispatcher's ordering, and return the
    /// top candidate. The Selector itself stays oblivious to request
    /// class — it never re-derives a bias-aware ranking here.
    #[must_use]
    pub fn select_preserving_order(&self, bias_sorted_candidates: &[Endpoint], target_geo: Option<&GeoTag>) -> Option<Endpoint> {
        self.filter(bias_sorted_candidates, target_geo).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;

    fn endpoint(id: &str, quality: f64) -> Endpoint {
        let mut e = Endpoint::new(id, id, "example.com", 8080, "http");
        e.quality = quality;
        e
    }

    #[test]
    fn cooldown_candidate_is_not_selected_when_alternative_exists() {
        let store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        let selector = Selector::new(&store, &availability, &tuning);

        let mut a = endpoint("a", 80.0);
        a.extend_cooldown(chrono::Duration::hours(1));
        let b = endpoint("b", 50.0);

        let picked = selector.select(&[a, b], None).unwrap();
        assert_eq!(picked.id, "b");
    }

    #[test]
    fn all_in_cooldown_falls_back_to_unfiltered_set() {
        let store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        let selector = Selector::new(&store, &availability, &tuning);

        let mut a = endpoint("a", 80.0);
        a.extend_cooldown(chrono::Duration::hours(1));
        let picked = selector.select(&[a], None).unwrap();
        assert_eq!(picked.id, "a");
    }

    #[test]
    fn higher_quality_and_metric_wins() {
        let store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        store.append("a", Sample::success(80.0, 5.0, 0.0, 0, 2e7));
        store.append("b", Sample::success(600.0, 60.0, 0.1, 0, 1e6));
        availability.record("a", true, false);
        availability.record("b", true, false);

        let selector = Selector::new(&store, &availability, &tuning);
        let a = endpoint("a", 70.0);
        let b = endpoint("b", 40.0);
        let picked = selector.select(&[a, b], None).unwrap();
        assert_eq!(picked.id, "a");
    }

    #[test]
    fn tie_break_prefers_lower_latency_then_id() {
        let store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        // Equal quality, equal availability: latency decides.
        store.append("b", Sample::success(50.0, 0.0, 0.0, 0, 0.0));
        store.append("a", Sample::success(100.0, 0.0, 0.0, 0, 0.0));

        let selector = Selector::new(&store, &availability, &tuning);
        let a = endpoint("a", 50.0);
        let b = endpoint("b", 50.0);
        let picked = selector.select(&[a, b], None).unwrap();
        assert_eq!(picked.id, "b", "lower observed latency should win the tie");
    }

    #[test]
    fn geo_hint_restricts_to_matching_candidates() {
        let store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        let selector = Selector::new(&store, &availability, &tuning);

        let mut a = endpoint("a", 40.0);
        a.geo = Some(GeoTag::new("CN"));
        let mut b = endpoint("b", 90.0);
        b.geo = Some(GeoTag::new("US"));

        let picked = selector.select(&[a, b], Some(&GeoTag::new("CN"))).unwrap();
        assert_eq!(picked.id, "a", "geo match should restrict the candidate pool even though b scores higher");
    }
}
