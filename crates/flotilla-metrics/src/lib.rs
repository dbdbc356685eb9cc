//! flotilla-metrics — observability for scheduling sessions.
//!
//! Tracks per-session scheduling outcomes (attempts, bindings,
//! evictions), per-queue capacity gauges, fit-error counts, and
//! end-to-end scheduling latency per job, and provides
//! Prometheus-compatible text exposition.
//!
//! # Architecture
//!
//! ```text
//! Collector
//!   ├── record_session()/record_attempts() ← called by the engine loop
//!   ├── record_binding()/record_eviction() ← called at session close
//!   ├── observe_e2e() ← called when a job's first task binds
//!   └── set_queue_gauges() ← refreshed from each session's queue state
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod collector;
pub mod prometheus;

pub use collector::{Collector, E2eSample, QueueGauges};
pub use prometheus::render_prometheus;
