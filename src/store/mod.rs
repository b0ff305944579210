//! Bounded, concurrency-friendly state: the Sample Store, the Availability
//! Tracker, and a generic LRU+TTL cache used for the Decision Cache and the
//! Geo Cache.

pub mod availability;
pub mod cache;
pub mod sample_store;

pub use availability::AvailabilityTracker;
pub use cache::LruTtlCache;
pub use sample_store::SampleStore;
