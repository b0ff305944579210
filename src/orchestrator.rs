//! Orchestrator (spec §4.12): wires every component together, preheats the
//! endpoint pool at startup, and re-evaluates endpoints on events (config
//! change, network coming back online, evaluation completion) — never on a
//! periodic timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::SchedulerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::geo::GeoResolver;
use crate::models::{Decision, Endpoint, RegionTable, RequestContext, RequestOutcome, Sample};
use crate::outcome::{OutcomeRecorder, OutcomeResult};
use crate::persistence::SnapshotStore;
use crate::probe::ProbeEngine;
use crate::registry::EndpointRegistry;
use crate::store::{AvailabilityTracker, SampleStore};

/// Owns every long-lived component and drives the evaluation and dispatch
/// lifecycle.
pub struct Orchestrator {
    config: SchedulerConfig,
    registry: EndpointRegistry,
    sample_store: SampleStore,
    availability: AvailabilityTracker,
    probe_engine: ProbeEngine,
    geo_resolver: GeoResolver,
    region_table: RegionTable,
    dispatcher: Dispatcher,
    snapshot_store: Option<SnapshotStore>,
}

impl Orchestrator {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;

        let registry = EndpointRegistry::from_configs(&config.endpoints);
        let sample_store = SampleStore::new(config.tuning.sample_window);
        let availability = AvailabilityTracker::new();
        let probe_engine = ProbeEngine::new(config.probe_timeout, config.tuning.retry_count, crate::USER_AGENT);
        let geo_resolver = GeoResolver::new(config.tuning.decision_cache_capacity, config.geo_external_lookup_disabled, config.tuning.geo_cache_fallback_ttl_secs);
        let region_table = RegionTable::compile(config.regions.clone())?;
        let dispatcher = Dispatcher::new(&config)?;
        let snapshot_store = config.snapshot_path.clone().map(SnapshotStore::new);

        Ok(Self {
            config,
            registry,
            sample_store,
            availability,
            probe_engine,
            geo_resolver,
            region_table,
            dispatcher,
            snapshot_store,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Load the persisted snapshot (if configured) and preheat the pool.
    /// Called once at process start.
    pub async fn start(&self) -> Result<()> {
        if let Some(store) = &self.snapshot_store {
            store.load_into(&self.sample_store)?;
        }
        self.preheat().await;
        Ok(())
    }

    /// Probe up to `tuning.preheat_count` endpoints concurrently, bounded
    /// by `tuning.concurrency_limit` (spec §4.12).
    pub async fn preheat(&self) {
        let mut candidates = self.registry.all();
        candidates.truncate(self.config.tuning.preheat_count);
        self.evaluate_many(&candidates).await;
        self.on_evaluation_completed();
    }

    /// Re-probe every currently registered endpoint. Triggered by events,
    /// never by a timer (spec §4.12).
    pub async fn reevaluate_all(&self) {
        let candidates = self.registry.all();
        self.evaluate_many(&candidates).await;
        self.on_evaluation_completed();
    }

    async fn evaluate_many(&self, endpoints: &[Endpoint]) {
        let semaphore = Arc::new(Semaphore::new(self.config.tuning.concurrency_limit.max(1)));

        // The permit must be acquired *inside* each task, not before it is
        // handed to `join_all`: acquiring up front serializes the loop
        // itself on the semaphore (nothing runs concurrently to release a
        // permit), which deadlocks as soon as there are more endpoints than
        // `concurrency_limit`. Acquiring inside the task body lets
        // `join_all` drive every acquisition concurrently instead.
        let tasks = endpoints.iter().map(|endpoint| {
            let semaphore = semaphore.clone();
            let endpoint = endpoint.clone();
            async move {
                let Ok(_permit) = semaphore.acquire_owned().await else { return };
                self.evaluate_endpoint(&endpoint).await;
            }
        });

        futures::future::join_all(tasks).await;
    }

    /// Probe one endpoint and record the outcome (spec §4.5 + §4.11).
    pub async fn evaluate_endpoint(&self, endpoint: &Endpoint) -> OutcomeResult {
        let sample = self.probe_engine.probe(endpoint).await;
        self.record_outcome(&endpoint.id, sample)
    }

    /// Record an externally-observed request outcome (as opposed to a
    /// scheduled probe) — the same recording path, just fed by the
    /// Dispatcher's callers instead of the preheat/re-evaluation loop.
    pub fn record_outcome(&self, endpoint_id: &str, sample: Sample) -> OutcomeResult {
        let recorder = OutcomeRecorder::new(&self.registry, &self.sample_store, &self.availability, &self.config.tuning);
        recorder.record(endpoint_id, sample)
    }

    /// Host → Outcome Recorder (Inbound), spec §6: the host reports one
    /// finished request here rather than building a `Sample` itself. The
    /// `url`/`method`/`headers`/`status` fields are accepted for parity with
    /// the documented interface but are not part of the scoring inputs
    /// (spec §4.11 only consumes latency/bytes/success/hardFail).
    pub fn record_request_outcome(&self, outcome: &RequestOutcome) -> OutcomeResult {
        let sample = Sample::from_outcome(outcome.latency_ms, outcome.bytes, outcome.success, outcome.hard_fail);
        self.record_outcome(&outcome.endpoint, sample)
    }

    /// Event hook: a config reload observed a changed endpoint set or
    /// tuning values. Re-evaluates immediately rather than waiting for the
    /// next natural probe.
    pub async fn on_config_changed(&self, new_config: SchedulerConfig) -> Result<()> {
        new_config.validate()?;
        self.reevaluate_all().await;
        Ok(())
    }

    /// Event hook: the network transitioned from offline to online.
    pub async fn on_network_online(&self) {
        self.reevaluate_all().await;
    }

    /// Registry cleanup runs only as a consequence of an evaluation
    /// completing (spec §4.8, §4.12) — never on its own timer.
    fn on_evaluation_completed(&self) {
        let removed = self.registry.cleanup_stale();
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "removed stale endpoints after evaluation");
        }
    }

    /// Dispatch one request.
    pub fn dispatch(&self, ctx: &RequestContext) -> Result<Decision> {
        let candidates = self.registry.all();
        self.dispatcher.dispatch(
            ctx,
            &candidates,
            &self.registry,
            &self.sample_store,
            &self.availability,
            &self.geo_resolver,
            &self.region_table,
            &self.config.tuning,
        )
    }

    /// Persist the sample-window snapshot on clean shutdown (spec §6).
    pub fn shutdown(&self) -> Result<()> {
        if let Some(store) = &self.snapshot_store {
            store.save_from(&self.sample_store)?;
        }
        Ok(())
    }
}

/// Interval used only to decide how long to wait between preheat batches
/// when the caller wants a staggered rollout; the Orchestrator itself never
/// schedules its own re-evaluation on a timer.
pub const PREHEAT_STAGGER: Duration = Duration::from_millis(50);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    fn cfg_with_endpoints(n: usize) -> SchedulerConfig {
        let mut cfg = SchedulerConfig::default();
        cfg.endpoints = (0..n)
            .map(|i| EndpointConfig {
                id: format!("ep{i}"),
                name: format!("Endpoint {i}"),
                server: "127.0.0.1:1".to_string(),
                probe_url: None,
                r#type: "http".to_string(),
            })
            .collect();
        cfg.probe_timeout = Duration::from_millis(50);
        cfg.tuning.retry_count = 0;
        cfg
    }

    #[tokio::test]
    async fn preheat_evaluates_bounded_candidate_set() {
        let cfg = cfg_with_endpoints(3);
        let orchestrator = Orchestrator::new(cfg).unwrap();
        orchestrator.preheat().await;
        for i in 0..3 {
            assert!(orchestrator.sample_store.len(&format!("ep{i}")) >= 1);
        }
    }

    #[test]
    fn dispatch_with_no_endpoints_returns_direct() {
        let cfg = SchedulerConfig::default();
        let orchestrator = Orchestrator::new(cfg).unwrap();
        let ctx = RequestContext {
            host: "example.com".into(),
            ..Default::default()
        };
        let decision = orchestrator.dispatch(&ctx).unwrap();
        assert_eq!(decision.endpoint_id(), None);
    }

    #[test]
    fn record_request_outcome_derives_a_sample_from_the_host_report() {
        let cfg = cfg_with_endpoints(1);
        let orchestrator = Orchestrator::new(cfg).unwrap();

        let outcome = RequestOutcome {
            endpoint: "ep0".to_string(),
            success: true,
            latency_ms: 40.0,
            bytes: 4096,
            hard_fail: false,
            url: Some("https://example.com".to_string()),
            method: Some("GET".to_string()),
            status: Some(200),
            ..Default::default()
        };
        let result = orchestrator.record_request_outcome(&outcome);
        assert!(result.emergency_failover.is_none());
        assert_eq!(orchestrator.sample_store.len("ep0"), 1);
        let recorded = orchestrator.sample_store.latest("ep0").unwrap();
        assert!(recorded.success);
        assert!(!recorded.hard_fail);
    }

    #[tokio::test]
    async fn evaluation_completion_prunes_low_quality_endpoints() {
        let cfg = cfg_with_endpoints(1);
        let orchestrator = Orchestrator::new(cfg).unwrap();
        orchestrator.registry.update_quality("ep0", -45.0);
        orchestrator.on_evaluation_completed();
        assert!(!orchestrator.registry.contains("ep0"));
    }
}
