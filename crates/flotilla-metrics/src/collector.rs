//! Metrics collector — tracks scheduling outcomes across sessions.
//!
//! Counters use atomics; the labeled series (per-queue gauges,
//! per-reason fit errors, e2e latencies) sit behind a cheap
//! `parking_lot` mutex. Every recording path is infallible: metric
//! emission is fire-and-forget and can never affect scheduling.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

/// Per-queue resource gauges, one value per resource dimension.
#[derive(Debug, Clone, Default)]
pub struct QueueGauges {
    pub allocated: BTreeMap<String, f64>,
    pub deserved: BTreeMap<String, f64>,
    pub capability: BTreeMap<String, f64>,
}

/// One observed end-to-end scheduling latency: time from job creation
/// to its first binding in a session.
#[derive(Debug, Clone)]
pub struct E2eSample {
    pub job: String,
    pub queue: String,
    pub seconds: f64,
}

#[derive(Default)]
struct Labeled {
    queues: BTreeMap<String, QueueGauges>,
    fit_errors: BTreeMap<String, u64>,
    e2e: Vec<E2eSample>,
}

/// Collects scheduling metrics across sessions.
///
/// Shared by the engine loop and the actions; render with
/// [`render_prometheus`](crate::render_prometheus).
#[derive(Default)]
pub struct Collector {
    sessions: AtomicU64,
    attempts: AtomicU64,
    bindings: AtomicU64,
    evictions: AtomicU64,
    labeled: Mutex<Labeled>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed session.
    pub fn record_session(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Count scheduling attempts (one per task considered by an action).
    pub fn record_attempts(&self, n: u64) {
        self.attempts.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_binding(&self) {
        self.bindings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Observe the end-to-end scheduling duration for a job, measured at
    /// bind time relative to job creation.
    pub fn observe_e2e(&self, job: &str, queue: &str, seconds: f64) {
        debug!(job, queue, seconds, "observed e2e scheduling duration");
        self.labeled.lock().e2e.push(E2eSample {
            job: job.to_string(),
            queue: queue.to_string(),
            seconds,
        });
    }

    /// Count a feasibility failure by reason.
    pub fn record_fit_error(&self, reason: &str) {
        *self
            .labeled
            .lock()
            .fit_errors
            .entry(reason.to_string())
            .or_insert(0) += 1;
    }

    /// Replace the gauges for one queue.
    pub fn set_queue_gauges(&self, queue: &str, gauges: QueueGauges) {
        self.labeled.lock().queues.insert(queue.to_string(), gauges);
    }

    pub fn sessions(&self) -> u64 {
        self.sessions.load(Ordering::Relaxed)
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn bindings(&self) -> u64 {
        self.bindings.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn fit_errors(&self) -> BTreeMap<String, u64> {
        self.labeled.lock().fit_errors.clone()
    }

    pub fn queue_gauges(&self) -> BTreeMap<String, QueueGauges> {
        self.labeled.lock().queues.clone()
    }

    /// Drain collected e2e samples (rendering consumes them so each
    /// latency is exported once).
    pub fn take_e2e_samples(&self) -> Vec<E2eSample> {
        std::mem::take(&mut self.labeled.lock().e2e)
    }
}
