//! The plugin capability surface.
//!
//! A plugin is a session-scoped object built by a registered builder.
//! Every capability has a default implementation meaning "no opinion":
//! orderings return `None`, predicates pass, filters abstain. The
//! session composes opinions across tiers (see `Session`); a capability
//! a plugin does not override is treated as identity.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use flotilla_api::{FitError, JobInfo, TaskId, TaskInfo};

use crate::state::{NodeState, QueueState, SessionState};

/// Outcome of a job validity check (gang/admission).
#[derive(Debug, Clone)]
pub struct ValidateResult {
    pub pass: bool,
    pub reason: String,
    pub message: String,
}

impl ValidateResult {
    pub fn pass() -> Self {
        Self {
            pass: true,
            reason: String::new(),
            message: String::new(),
        }
    }

    pub fn fail(reason: &str, message: String) -> Self {
        Self {
            pass: false,
            reason: reason.to_string(),
            message,
        }
    }
}

/// A policy plugin. Implementations override the capabilities they
/// provide and leave the rest at their defaults.
///
/// Plugin methods are expected to be CPU-bound and must not perform
/// I/O; predicates and node-order functions are called from parallel
/// workers.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called once after the session's working state is built; the
    /// place to precompute per-session attributes.
    fn on_session_open(&mut self, _state: &SessionState) {}

    fn on_session_close(&mut self, _state: &SessionState) {}

    /// Total ordering on jobs for dispatch. `Some(Ordering::Equal)`
    /// defers to lower tiers just like `None`.
    fn job_order(&self, _a: &JobInfo, _b: &JobInfo) -> Option<Ordering> {
        None
    }

    fn queue_order(&self, _a: &QueueState, _b: &QueueState) -> Option<Ordering> {
        None
    }

    fn task_order(&self, _a: &TaskInfo, _b: &TaskInfo) -> Option<Ordering> {
        None
    }

    /// Task-global feasibility precheck, run once per task before the
    /// per-node fan-out.
    fn pre_predicate(&self, _state: &SessionState, _task: &TaskInfo) -> Result<(), FitError> {
        Ok(())
    }

    /// Hard per-node feasibility.
    fn predicate(&self, _task: &TaskInfo, _node: &NodeState) -> Result<(), FitError> {
        Ok(())
    }

    /// Per-node score contribution (higher is better).
    fn node_order(&self, _task: &TaskInfo, _node: &NodeState) -> Option<f64> {
        None
    }

    /// Normalize this plugin's own scores across nodes. Returns whether
    /// anything was changed.
    fn node_order_reduce(&self, _task: &TaskInfo, _scores: &mut BTreeMap<String, f64>) -> bool {
        false
    }

    /// Holistic scoring over the full candidate set.
    fn batch_node_order(
        &self,
        _task: &TaskInfo,
        _nodes: &[&NodeState],
    ) -> Option<BTreeMap<String, f64>> {
        None
    }

    /// Override the final node choice among scored candidates.
    fn best_node(&self, _task: &TaskInfo, _scores: &BTreeMap<String, f64>) -> Option<String> {
        None
    }

    /// Gang/admission validity; invalid jobs have their tentative
    /// session effects rolled back at close.
    fn job_valid(&self, _job: &JobInfo) -> Option<ValidateResult> {
        None
    }

    /// Whether a pending group may enter its queue.
    fn job_enqueueable(
        &self,
        _state: &SessionState,
        _queue: &QueueState,
        _job: &JobInfo,
    ) -> Option<bool> {
        None
    }

    /// Queue-level quota check for one task.
    fn allocatable(&self, _queue: &QueueState, _task: &TaskInfo) -> Option<bool> {
        None
    }

    /// Whether a queue has exceeded its deserved share.
    fn overused(&self, _queue: &QueueState) -> Option<bool> {
        None
    }

    /// Filter preemption victims; returns the uids to keep.
    fn preemptable(
        &self,
        _state: &SessionState,
        _preemptor: &TaskInfo,
        _victims: &[TaskInfo],
    ) -> Option<Vec<TaskId>> {
        None
    }

    /// Filter reclamation victims; returns the uids to keep.
    fn reclaimable(
        &self,
        _state: &SessionState,
        _reclaimer: &TaskInfo,
        _victims: &[TaskInfo],
    ) -> Option<Vec<TaskId>> {
        None
    }
}
