//! Outcome Recorder (spec §4.11): folds one probe/request outcome back
//! into the Sample Store, the Availability Tracker and the endpoint's
//! quality EMA, and runs the emergency failover check.

use crate::config::Tuning;
use crate::models::{Endpoint, Sample};
use crate::registry::EndpointRegistry;
use crate::scoring::predictive::predictive_adjustment;
use crate::scoring::quality::metric_score;
use crate::selector::Selector;
use crate::store::{AvailabilityTracker, SampleStore};

/// Composite quality floor below which the current endpoint is considered
/// in trouble even without a hard-fail streak (spec §4.11 step 4).
const EMERGENCY_QUALITY_FLOOR: f64 = 30.0;
/// Success-rate floor for the same check.
const EMERGENCY_RATE_FLOOR: f64 = 0.75;

/// What happened as a result of recording one outcome.
#[derive(Debug, Clone)]
pub struct OutcomeResult {
    pub delta_applied: f64,
    /// Set only when the hard-fail streak itself tripped the threshold: the
    /// endpoint's cooldown was explicitly cleared and a replacement
    /// "current" endpoint was selected, bypassing the normal cooldown filter
    /// (spec §4.11 step 4, first bullet).
    pub emergency_failover: Option<Endpoint>,
    /// Set when the endpoint looked troubled for a reason other than the
    /// hard-fail streak (low rate, high latency, low quality): its cooldown
    /// was (re-)set, which naturally forces the next dispatch's Selector
    /// pass to look elsewhere — a "normal re-selection bound by cooldown"
    /// (spec §4.11 step 4, second bullet), as opposed to the first bullet's
    /// explicit cooldown-bypassing reselect.
    pub forced_reselection: bool,
}

pub struct OutcomeRecorder<'a> {
    registry: &'a EndpointRegistry,
    sample_store: &'a SampleStore,
    availability: &'a AvailabilityTracker,
    tuning: &'a Tuning,
}

impl<'a> OutcomeRecorder<'a> {
    #[must_use]
    pub fn new(registry: &'a EndpointRegistry, sample_store: &'a SampleStore, availability: &'a AvailabilityTracker, tuning: &'a Tuning) -> Self {
        Self {
            registry,
            sample_store,
            availability,
            tuning,
        }
    }

    /// Record `sample` for `endpoint_id` and apply every downstream effect
    /// (spec §4.11 steps 1-5).
    pub fn record(&self, endpoint_id: &str, sample: Sample) -> OutcomeResult {
        self.sample_store.append(endpoint_id, sample.clone());
        self.availability.record(endpoint_id, sample.counts_as_success(), sample.hard_fail);

        let recent_quality = self.registry.get(endpoint_id).map_or(50.0, |e| e.quality);
        let window = self.sample_store.window(endpoint_id);
        let latest_outcome_failed = !sample.success;

        let predictive_delta = predictive_adjustment(&window, recent_quality, latest_outcome_failed, self.tuning);
        // metricScore is a [0,100] composite; center it on the quality EMA's
        // own midpoint so an average sample is a no-op, a good one pulls
        // quality up, and a bad one pulls it down — `Endpoint::update_quality`
        // clamps the resulting delta to ±20 either way.
        let metric_delta = metric_score(&sample, self.tuning) - 50.0;
        let delta = metric_delta + predictive_delta;
        self.registry.update_quality(endpoint_id, delta);

        // Spec §4.11 step 4: the check only fires for the endpoint currently
        // carrying live traffic. Before any endpoint has ever been marked
        // current, nothing to compare against yet — treat every endpoint as
        // eligible so the very first probed endpoint isn't exempt forever.
        let is_current = match self.registry.current_endpoint() {
            Some(cur) => cur == endpoint_id,
            None => true,
        };
        let streak = self.availability.streak(endpoint_id);
        let rate = self.availability.rate(endpoint_id);
        let post_quality = self.registry.get(endpoint_id).map_or(0.0, |e| e.quality);
        let in_trouble = streak >= self.tuning.emergency_hard_fail_count
            || rate < EMERGENCY_RATE_FLOOR
            || sample.latency_ms > self.tuning.latency_cap_ms
            || post_quality < EMERGENCY_QUALITY_FLOOR;

        let mut emergency_failover = None;
        let mut forced_reselection = false;
        if is_current && streak >= self.tuning.emergency_hard_fail_count {
            self.registry.clear_cooldown(endpoint_id);
            emergency_failover = self.reselect_current();
        } else if is_current && in_trouble {
            // A normal re-selection bound by cooldown: setting the cooldown
            // here is sufficient, the next dispatch's Selector pass will
            // naturally filter this endpoint out rather than being forced
            // eagerly from here.
            self.registry.set_cooldown(endpoint_id, self.tuning);
            forced_reselection = true;
        } else {
            self.registry.set_cooldown(endpoint_id, self.tuning);
        }

        OutcomeResult { delta_applied: delta, emergency_failover, forced_reselection }
    }

    /// Pick a new current endpoint from the full registry and record it
    /// (spec §4.11: "clear cooldown + reselect" on emergency failover).
    fn reselect_current(&self) -> Option<Endpoint> {
        let candidates = self.registry.all();
        let selector = Selector::new(self.sample_store, self.availability, self.tuning);
        let picked = selector.select(&candidates, None)?;
        self.registry.set_current(&picked.id);
        Some(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

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
    fn successful_outcome_increases_quality() {
        let registry = EndpointRegistry::from_configs(&[cfg("a")]);
        let sample_store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        let recorder = OutcomeRecorder::new(&registry, &sample_store, &availability, &tuning);

        let before = registry.get("a").unwrap().quality;
        recorder.record("a", Sample::success(50.0, 5.0, 0.0, 2048, 2e7));
        let after = registry.get("a").unwrap().quality;
        assert!(after >= before);
    }

    #[test]
    fn hard_failure_decreases_quality() {
        let registry = EndpointRegistry::from_configs(&[cfg("a")]);
        let sample_store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        let recorder = OutcomeRecorder::new(&registry, &sample_store, &availability, &tuning);

        let before = registry.get("a").unwrap().quality;
        recorder.record("a", Sample::hard_failure(5000.0));
        let after = registry.get("a").unwrap().quality;
        assert!(after < before, "a hard failure must reduce quality, {before} -> {after}");
    }

    #[test]
    fn streak_reaching_threshold_triggers_emergency_failover() {
        let registry = EndpointRegistry::from_configs(&[cfg("a"), cfg("b")]);
        let sample_store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let mut tuning = Tuning::default();
        tuning.emergency_hard_fail_count = 2;
        let recorder = OutcomeRecorder::new(&registry, &sample_store, &availability, &tuning);

        let first = recorder.record("a", Sample::hard_failure(5000.0));
        assert!(first.emergency_failover.is_none());
        let second = recorder.record("a", Sample::hard_failure(5000.0));
        assert!(second.emergency_failover.is_some());
        assert!(!registry.get("a").unwrap().is_in_cooldown(), "emergency failover must clear cooldown on the failing endpoint");
    }

    #[test]
    fn below_threshold_sets_cooldown_instead_of_failing_over() {
        let registry = EndpointRegistry::from_configs(&[cfg("a")]);
        let sample_store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        let recorder = OutcomeRecorder::new(&registry, &sample_store, &availability, &tuning);

        let result = recorder.record("a", Sample::success(50.0, 5.0, 0.0, 1024, 1e6));
        assert!(result.emergency_failover.is_none());
        assert!(registry.get("a").unwrap().is_in_cooldown());
    }

    #[test]
    fn single_hard_failure_forces_a_cooldown_bound_reselection_not_a_bypass() {
        let registry = EndpointRegistry::from_configs(&[cfg("a"), cfg("b")]);
        let sample_store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let tuning = Tuning::default();
        let recorder = OutcomeRecorder::new(&registry, &sample_store, &availability, &tuning);

        // One hard failure drops the success rate to 0, tripping the
        // low-rate branch of the emergency check even though the streak
        // (1) is below the emergency threshold (2): a normal, cooldown-bound
        // reselection should be flagged, but the cooldown-bypassing
        // emergency path must not fire yet.
        let result = recorder.record("a", Sample::hard_failure(5000.0));
        assert!(result.emergency_failover.is_none());
        assert!(result.forced_reselection);
        assert!(registry.get("a").unwrap().is_in_cooldown());
    }

    #[test]
    fn non_current_endpoint_does_not_trip_the_emergency_check() {
        let registry = EndpointRegistry::from_configs(&[cfg("a"), cfg("b")]);
        registry.set_current("b");
        let sample_store = SampleStore::new(50);
        let availability = AvailabilityTracker::new();
        let mut tuning = Tuning::default();
        tuning.emergency_hard_fail_count = 2;
        let recorder = OutcomeRecorder::new(&registry, &sample_store, &availability, &tuning);

        recorder.record("a", Sample::hard_failure(5000.0));
        let second = recorder.record("a", Sample::hard_failure(5000.0));
        assert!(second.emergency_failover.is_none(), "a is not the current endpoint, so its failures must not trigger failover");
    }
}
