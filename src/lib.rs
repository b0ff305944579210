//! Adaptive outbound proxy scheduler.
//!
//! Continuously probes a configured pool of outbound proxy endpoints, tracks
//! per-endpoint reputation from both live probes and observed request
//! outcomes, and selects the best endpoint for a given request under
//! contextual hints (geography, request class, payload size, destination
//! port/protocol).
//!
//! # Core components
//! - Sample Store / Availability Tracker / LRU+TTL Cache ([`store`])
//! - Probe Engine ([`probe`]) and the Geo Resolver ([`geo`])
//! - Deterministic Quality Scorer and Predictive Scorer ([`scoring`])
//! - Endpoint Registry ([`registry`]), Selector ([`selector`]) and
//!   Dispatcher ([`dispatcher`])
//! - Outcome Recorder ([`outcome`]) and the Orchestrator ([`orchestrator`])
//! that wires everything together
//!
//! # Example
//! ```rust
//! use adaptive_proxy_scheduler::{Orchestrator, SchedulerConfig, RequestContext};
//!
//! # async fn example() -> adaptive_proxy_scheduler::Result<()> {
//! let config = SchedulerConfig::default();
//! let orchestrator = Orchestrator::new(config)?;
//! orchestrator.start().await?;
//! let decision = orchestrator.dispatch(&RequestContext {
//!     host: "example.com".to_string(),
//!     ..Default::default()
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod format_utils;
pub mod geo;
pub mod mirror;
pub mod models;
pub mod orchestrator;
pub mod outcome;
pub mod persistence;
pub mod probe;
pub mod registry;
pub mod scoring;
pub mod selector;
pub mod store;
pub mod time_utils;

pub use config::SchedulerConfig;
pub use dispatcher::Dispatcher;
pub use error::{ErrorContext, Result, SchedulerError};
pub use models::{Classification, Decision, DispatchMode, Endpoint, GeoTag, RegionRule, RegionTable, RequestContext, RequestOutcome, Sample};
pub use orchestrator::Orchestrator;
pub use outcome::{OutcomeRecorder, OutcomeResult};
pub use registry::EndpointRegistry;
pub use selector::Selector;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default user agent string used by the Probe Engine.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
