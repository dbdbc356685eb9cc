//! The scheduling session — one pass of the engine over a snapshot.
//!
//! A session owns the mutable working state, the tier-composed plugin
//! functions, and the operation log that makes gang rollback possible.
//! Actions drive it strictly sequentially; the only parallelism lives
//! inside the predicate and prioritize helpers, which read the session
//! immutably.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, warn};

use flotilla_api::{
    ClusterSnapshot, FitError, FitErrors, JobId, JobInfo, JobPhase, QueueId, Resource, TaskId,
    TaskInfo, TaskStatus,
};
use flotilla_metrics::{Collector, QueueGauges};

use crate::binder::Binder;
use crate::conf::{PluginOption, Tier};
use crate::error::{FrameworkError, FrameworkResult};
use crate::plugin::{Plugin, ValidateResult};
use crate::registry::PluginRegistry;
use crate::state::{NodeState, QueueState, SessionState};

/// A tentative session operation, logged so a gang-invalid job can be
/// unwound in reverse order at close.
#[derive(Debug, Clone)]
enum Operation {
    Allocate {
        task: TaskId,
        job: JobId,
        node: String,
    },
    Pipeline {
        task: TaskId,
        job: JobId,
        node: String,
    },
    Evict {
        task: TaskId,
        job: JobId,
        node: String,
        reason: String,
        prev_status: TaskStatus,
    },
}

impl Operation {
    fn job(&self) -> &JobId {
        match self {
            Operation::Allocate { job, .. }
            | Operation::Pipeline { job, .. }
            | Operation::Evict { job, .. } => job,
        }
    }
}

struct PluginRuntime {
    option: PluginOption,
    plugin: Box<dyn Plugin>,
}

struct TierRuntime {
    plugins: Vec<PluginRuntime>,
}

/// What a closed session handed to the binder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResult {
    /// Task key → node.
    pub bindings: BTreeMap<String, String>,
    /// Task key → eviction reason.
    pub evictions: BTreeMap<String, String>,
    /// Task key → node reserved for the next session.
    pub pipelined: BTreeMap<String, String>,
    /// Job key → reported phase.
    pub status_updates: BTreeMap<String, JobPhase>,
}

pub struct Session {
    pub state: SessionState,
    tiers: Vec<TierRuntime>,
    ops: Vec<Operation>,
    enqueued: BTreeSet<JobId>,
    deadline: Option<Instant>,
    collector: Arc<Collector>,
}

impl Session {
    /// Open a session: build the working state and the session-scoped
    /// plugin instances. An unknown plugin name fails the open and the
    /// driver skips the cycle.
    pub fn open(
        snapshot: Arc<ClusterSnapshot>,
        tiers: &[Tier],
        registry: &PluginRegistry,
        collector: Arc<Collector>,
        deadline: Option<Instant>,
    ) -> FrameworkResult<Self> {
        let state = SessionState::new(snapshot);

        let mut runtimes = Vec::with_capacity(tiers.len());
        for tier in tiers {
            let mut plugins = Vec::with_capacity(tier.plugins.len());
            for option in &tier.plugins {
                let mut plugin = registry.build(option)?;
                plugin.on_session_open(&state);
                plugins.push(PluginRuntime {
                    option: option.clone(),
                    plugin,
                });
            }
            runtimes.push(TierRuntime { plugins });
        }

        debug!(
            generation = state.snapshot.generation,
            nodes = state.nodes.len(),
            jobs = state.jobs.len(),
            queues = state.queues.len(),
            "session opened"
        );

        Ok(Self {
            state,
            tiers: runtimes,
            ops: Vec::new(),
            enqueued: BTreeSet::new(),
            deadline,
            collector,
        })
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Whether the driver-imposed deadline has passed. Actions poll
    /// this between tasks; the in-flight task always completes.
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    // ---- session operations -------------------------------------------------

    /// Record a tentative binding. The task must be pending and the
    /// node must have enough idle capacity; on failure the overlay is
    /// left unchanged.
    pub fn allocate(&mut self, task_uid: &TaskId, node_name: &str) -> FrameworkResult<()> {
        let (job_id, request) = self.check_placeable(task_uid)?;
        {
            let node = self
                .state
                .nodes
                .get(node_name)
                .ok_or_else(|| FrameworkError::NodeNotFound(node_name.to_string()))?;
            if !request.less_equal(&node.idle) {
                return Err(FrameworkError::InsufficientIdle {
                    task: task_uid.clone(),
                    node: node_name.to_string(),
                });
            }
        }

        let task = self.set_task_placement(&job_id, task_uid, TaskStatus::Bound, node_name)?;
        if let Some(node) = self.state.nodes.get_mut(node_name) {
            node.add_task(task.clone());
        }
        self.credit_queue(&job_id, &task, true);
        debug!(task = %task.key(), node = node_name, "allocated task");
        self.ops.push(Operation::Allocate {
            task: task_uid.clone(),
            job: job_id,
            node: node_name.to_string(),
        });
        Ok(())
    }

    /// Reserve a node for a task without binding, against capacity that
    /// becomes free as victims release. Materialized only in a later
    /// session, once the victims are actually gone.
    pub fn pipeline(&mut self, task_uid: &TaskId, node_name: &str) -> FrameworkResult<()> {
        let (job_id, request) = self.check_placeable(task_uid)?;
        {
            let node = self
                .state
                .nodes
                .get(node_name)
                .ok_or_else(|| FrameworkError::NodeNotFound(node_name.to_string()))?;
            if !request.less_equal(&node.future_idle()) {
                return Err(FrameworkError::InsufficientIdle {
                    task: task_uid.clone(),
                    node: node_name.to_string(),
                });
            }
        }

        let task = self.set_task_placement(&job_id, task_uid, TaskStatus::Pipelined, node_name)?;
        if let Some(node) = self.state.nodes.get_mut(node_name) {
            node.add_task(task.clone());
        }
        self.credit_queue(&job_id, &task, true);
        debug!(task = %task.key(), node = node_name, "pipelined task");
        self.ops.push(Operation::Pipeline {
            task: task_uid.clone(),
            job: job_id,
            node: node_name.to_string(),
        });
        Ok(())
    }

    /// Mark a running task for release. Its resources count as
    /// about-to-be-free for reservations made later in this session.
    pub fn evict(&mut self, task_uid: &TaskId, reason: &str) -> FrameworkResult<()> {
        let job_id = self
            .state
            .task_index
            .get(task_uid)
            .cloned()
            .ok_or_else(|| FrameworkError::TaskNotFound(task_uid.clone()))?;
        let (prev_status, node_name, task) = {
            let job = self
                .state
                .jobs
                .get(&job_id)
                .ok_or_else(|| FrameworkError::TaskNotFound(task_uid.clone()))?;
            let task = job
                .tasks
                .get(task_uid)
                .ok_or_else(|| FrameworkError::TaskNotFound(task_uid.clone()))?;
            if !task.status.alive() || task.status == TaskStatus::Releasing {
                return Err(FrameworkError::TaskNotEvictable(
                    task.key(),
                    task.status,
                ));
            }
            let node_name = task
                .node_name
                .clone()
                .ok_or_else(|| FrameworkError::NodeNotFound(task.key()))?;
            (task.status, node_name, task.clone())
        };

        if let Some(job) = self.state.jobs.get_mut(&job_id) {
            if let Some(t) = job.tasks.get_mut(task_uid) {
                t.status = TaskStatus::Releasing;
            }
        }
        if let Some(node) = self.state.nodes.get_mut(&node_name) {
            node.release_task(task_uid);
        }
        self.credit_queue(&job_id, &task, false);
        info!(task = %task.key(), node = %node_name, reason, "evicting task");
        self.ops.push(Operation::Evict {
            task: task_uid.clone(),
            job: job_id,
            node: node_name,
            reason: reason.to_string(),
            prev_status,
        });
        Ok(())
    }

    /// Admit a pending job group to its queue.
    pub fn enqueue_job(&mut self, job_id: &JobId) -> FrameworkResult<()> {
        let job = self
            .state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| FrameworkError::JobNotFound(job_id.clone()))?;
        job.pending = false;
        self.enqueued.insert(job_id.clone());
        debug!(job = %job.key(), queue = %job.queue, "job admitted to queue");
        Ok(())
    }

    /// Attach fit diagnostics to a task and count them in metrics.
    pub fn record_fit_errors(&mut self, job_id: &JobId, task_uid: &TaskId, errors: FitErrors) {
        for (reason, count) in errors.reasons() {
            for _ in 0..count {
                self.collector.record_fit_error(&reason);
            }
        }
        if let Some(job) = self.state.jobs.get_mut(job_id) {
            job.fit_errors.insert(task_uid.clone(), errors);
        }
    }

    fn check_placeable(&self, task_uid: &TaskId) -> FrameworkResult<(JobId, Resource)> {
        let job_id = self
            .state
            .task_index
            .get(task_uid)
            .cloned()
            .ok_or_else(|| FrameworkError::TaskNotFound(task_uid.clone()))?;
        let job = self
            .state
            .jobs
            .get(&job_id)
            .ok_or_else(|| FrameworkError::TaskNotFound(task_uid.clone()))?;
        let task = job
            .tasks
            .get(task_uid)
            .ok_or_else(|| FrameworkError::TaskNotFound(task_uid.clone()))?;
        if task.status != TaskStatus::Pending {
            return Err(FrameworkError::TaskNotPending(task.key()));
        }
        Ok((job_id, task.request.clone()))
    }

    fn set_task_placement(
        &mut self,
        job_id: &JobId,
        task_uid: &TaskId,
        status: TaskStatus,
        node_name: &str,
    ) -> FrameworkResult<TaskInfo> {
        let job = self
            .state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| FrameworkError::TaskNotFound(task_uid.clone()))?;
        let task = job
            .tasks
            .get_mut(task_uid)
            .ok_or_else(|| FrameworkError::TaskNotFound(task_uid.clone()))?;
        task.status = status;
        task.node_name = Some(node_name.to_string());
        Ok(task.clone())
    }

    fn credit_queue(&mut self, job_id: &JobId, task: &TaskInfo, add: bool) {
        let Some(job) = self.state.jobs.get(job_id) else {
            return;
        };
        if let Some(queue) = self.state.queues.get_mut(&job.queue) {
            if add {
                queue.allocated.add(&task.request);
            } else {
                queue.allocated.sub(&task.request);
            }
        }
    }

    /// Undo every tentative operation of one job, newest first.
    fn rollback_job(&mut self, job_id: &JobId) {
        let mut undone = 0;
        for idx in (0..self.ops.len()).rev() {
            if self.ops[idx].job() != job_id {
                continue;
            }
            let op = self.ops.remove(idx);
            undone += 1;
            match op {
                Operation::Allocate { task, job, node }
                | Operation::Pipeline { task, job, node } => {
                    if let Some(n) = self.state.nodes.get_mut(&node) {
                        n.remove_task(&task);
                    }
                    let request = self.reset_task_pending(&job, &task);
                    if let (Some(req), Some(queue_id)) =
                        (request, self.state.jobs.get(&job).map(|j| j.queue.clone()))
                    {
                        if let Some(queue) = self.state.queues.get_mut(&queue_id) {
                            queue.allocated.sub(&req);
                        }
                    }
                }
                Operation::Evict {
                    task,
                    job,
                    node,
                    prev_status,
                    ..
                } => {
                    if let Some(n) = self.state.nodes.get_mut(&node) {
                        n.unrelease_task(&task, prev_status);
                    }
                    let request = self.restore_task_status(&job, &task, prev_status);
                    if let (Some(req), Some(queue_id)) =
                        (request, self.state.jobs.get(&job).map(|j| j.queue.clone()))
                    {
                        if let Some(queue) = self.state.queues.get_mut(&queue_id) {
                            queue.allocated.add(&req);
                        }
                    }
                }
            }
        }
        debug!(job = %job_id, undone, "rolled back job operations");
    }

    fn reset_task_pending(
        &mut self,
        job_id: &JobId,
        task_uid: &TaskId,
    ) -> Option<Resource> {
        let job = self.state.jobs.get_mut(job_id)?;
        let task = job.tasks.get_mut(task_uid)?;
        task.status = TaskStatus::Pending;
        task.node_name = None;
        Some(task.request.clone())
    }

    fn restore_task_status(
        &mut self,
        job_id: &JobId,
        task_uid: &TaskId,
        status: TaskStatus,
    ) -> Option<Resource> {
        let job = self.state.jobs.get_mut(job_id)?;
        let task = job.tasks.get_mut(task_uid)?;
        task.status = status;
        Some(task.request.clone())
    }

    // ---- close --------------------------------------------------------------

    /// Validate gang invariants, roll back invalid jobs, and flush the
    /// surviving decisions to the binder.
    pub fn close(&mut self, binder: &dyn Binder) -> SessionResult {
        let touched: BTreeSet<JobId> = self.ops.iter().map(|op| op.job().clone()).collect();
        for job_id in &touched {
            let Some(job) = self.state.jobs.get(job_id) else {
                continue;
            };
            // Gang atomicity: a touched job either reaches its member
            // threshold or contributes nothing to this session.
            let verdict = self.job_valid(job);
            if job.is_ready() && verdict.pass {
                continue;
            }
            warn!(
                job = %job.key(),
                ready = job.ready_task_num(),
                min_member = job.min_member,
                reason = %verdict.reason,
                "rolling back gang-invalid job"
            );
            self.rollback_job(job_id);
        }

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut result = SessionResult::default();
        let mut bound_jobs: BTreeSet<JobId> = BTreeSet::new();
        for op in &self.ops {
            match op {
                Operation::Allocate { task, job, node } => {
                    let Some(info) = self.state.jobs.get(job).and_then(|j| j.tasks.get(task))
                    else {
                        continue;
                    };
                    if let Err(err) = binder.bind(info, node) {
                        error!(task = %info.key(), node = %node, %err, "bind failed");
                        continue;
                    }
                    result.bindings.insert(info.key(), node.clone());
                    self.collector.record_binding();
                    if bound_jobs.insert(job.clone()) {
                        if let Some(j) = self.state.jobs.get(job) {
                            let waited =
                                (now_ms.saturating_sub(j.creation_epoch_ms)) as f64 / 1000.0;
                            self.collector.observe_e2e(&j.key(), &j.queue, waited);
                        }
                    }
                }
                Operation::Pipeline { task, job, node } => {
                    if let Some(info) = self.state.jobs.get(job).and_then(|j| j.tasks.get(task)) {
                        result.pipelined.insert(info.key(), node.clone());
                    }
                }
                Operation::Evict {
                    task, job, reason, ..
                } => {
                    let Some(info) = self.state.jobs.get(job).and_then(|j| j.tasks.get(task))
                    else {
                        continue;
                    };
                    if let Err(err) = binder.evict(info, reason) {
                        error!(task = %info.key(), %err, "evict failed");
                        continue;
                    }
                    result.evictions.insert(info.key(), reason.clone());
                    self.collector.record_eviction();
                }
            }
        }

        // Report phase changes for every job the session touched.
        let mut report: BTreeSet<JobId> = touched;
        report.extend(self.enqueued.iter().cloned());
        for job_id in &report {
            let (Some(job), Some(before)) = (
                self.state.jobs.get(job_id),
                self.state.snapshot.jobs.get(job_id),
            ) else {
                continue;
            };
            let phase = job.phase();
            if phase != before.phase() {
                if let Err(err) = binder.update_job_status(job, phase) {
                    error!(job = %job.key(), %err, "status update failed");
                    continue;
                }
                result.status_updates.insert(job.key(), phase);
            }
        }

        for (queue_id, queue) in &self.state.queues {
            self.collector.set_queue_gauges(
                queue_id,
                QueueGauges {
                    allocated: queue.allocated.dimensions().map(own_dim).collect(),
                    deserved: queue.info.deserved.dimensions().map(own_dim).collect(),
                    capability: queue.info.capability.dimensions().map(own_dim).collect(),
                },
            );
        }

        for tier in &mut self.tiers {
            for p in &mut tier.plugins {
                p.plugin.on_session_close(&self.state);
            }
        }

        self.collector.record_session();
        debug!(
            bindings = result.bindings.len(),
            evictions = result.evictions.len(),
            pipelined = result.pipelined.len(),
            "session closed"
        );
        result
    }

    // ---- composed plugin functions ------------------------------------------

    pub fn job_order(&self, a: &JobInfo, b: &JobInfo) -> Ordering {
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.job_order_enabled() {
                    continue;
                }
                if let Some(ord) = p.plugin.job_order(a, b) {
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
        a.creation_epoch_ms
            .cmp(&b.creation_epoch_ms)
            .then_with(|| a.uid.cmp(&b.uid))
    }

    pub fn queue_order(&self, a: &QueueState, b: &QueueState) -> Ordering {
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.queue_order_enabled() {
                    continue;
                }
                if let Some(ord) = p.plugin.queue_order(a, b) {
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
        a.info.uid.cmp(&b.info.uid)
    }

    pub fn task_order(&self, a: &TaskInfo, b: &TaskInfo) -> Ordering {
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.task_order_enabled() {
                    continue;
                }
                if let Some(ord) = p.plugin.task_order(a, b) {
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
        a.uid.cmp(&b.uid)
    }

    pub fn pre_predicate(&self, task: &TaskInfo) -> Result<(), FitError> {
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.predicate_enabled() {
                    continue;
                }
                p.plugin.pre_predicate(&self.state, task)?;
            }
        }
        Ok(())
    }

    /// Composed hard feasibility: every enabled predicate in every tier
    /// must pass.
    pub fn predicate(&self, task: &TaskInfo, node: &NodeState) -> Result<(), FitError> {
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.predicate_enabled() {
                    continue;
                }
                p.plugin.predicate(task, node)?;
            }
        }
        Ok(())
    }

    /// Gang/admission validity with tier short-circuit: the first tier
    /// holding any opinion decides.
    pub fn job_valid(&self, job: &JobInfo) -> ValidateResult {
        for tier in &self.tiers {
            let mut opined = false;
            for p in &tier.plugins {
                if !p.option.job_valid_enabled() {
                    continue;
                }
                if let Some(verdict) = p.plugin.job_valid(job) {
                    if !verdict.pass {
                        return verdict;
                    }
                    opined = true;
                }
            }
            if opined {
                return ValidateResult::pass();
            }
        }
        ValidateResult::pass()
    }

    pub fn job_enqueueable(&self, job: &JobInfo) -> bool {
        let Some(queue) = self.state.queues.get(&job.queue) else {
            return false;
        };
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.job_enqueued_enabled() {
                    continue;
                }
                if p.plugin.job_enqueueable(&self.state, queue, job) == Some(false) {
                    return false;
                }
            }
        }
        true
    }

    pub fn allocatable(&self, queue_id: &QueueId, task: &TaskInfo) -> bool {
        let Some(queue) = self.state.queues.get(queue_id) else {
            return false;
        };
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.allocatable_enabled() {
                    continue;
                }
                if p.plugin.allocatable(queue, task) == Some(false) {
                    return false;
                }
            }
        }
        true
    }

    pub fn overused(&self, queue_id: &QueueId) -> bool {
        let Some(queue) = self.state.queues.get(queue_id) else {
            return false;
        };
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.overused_enabled() {
                    continue;
                }
                if p.plugin.overused(queue) == Some(true) {
                    return true;
                }
            }
        }
        false
    }

    /// Filter preemption victims: within a tier every opinionated
    /// plugin's filter intersects; the first tier with an opinion wins.
    pub fn preemptable(&self, preemptor: &TaskInfo, victims: &[TaskInfo]) -> Vec<TaskInfo> {
        self.filter_victims(victims, |p, current| {
            if !p.option.preemptable_enabled() {
                return None;
            }
            p.plugin.preemptable(&self.state, preemptor, current)
        })
    }

    /// Filter reclamation victims, same composition as
    /// [`preemptable`](Self::preemptable).
    pub fn reclaimable(&self, reclaimer: &TaskInfo, victims: &[TaskInfo]) -> Vec<TaskInfo> {
        self.filter_victims(victims, |p, current| {
            if !p.option.reclaimable_enabled() {
                return None;
            }
            p.plugin.reclaimable(&self.state, reclaimer, current)
        })
    }

    fn filter_victims(
        &self,
        victims: &[TaskInfo],
        apply: impl Fn(&PluginRuntime, &[TaskInfo]) -> Option<Vec<TaskId>>,
    ) -> Vec<TaskInfo> {
        for tier in &self.tiers {
            let mut current: Vec<TaskInfo> = victims.to_vec();
            let mut opined = false;
            for p in &tier.plugins {
                if let Some(kept) = apply(p, &current) {
                    opined = true;
                    current.retain(|t| kept.contains(&t.uid));
                }
            }
            if opined {
                return current;
            }
        }
        victims.to_vec()
    }

    /// First plugin override of the final node choice, validated
    /// against the scored candidates.
    pub fn best_node(&self, task: &TaskInfo, scores: &BTreeMap<String, f64>) -> Option<String> {
        for tier in &self.tiers {
            for p in &tier.plugins {
                if !p.option.best_node_enabled() {
                    continue;
                }
                if let Some(node) = p.plugin.best_node(task, scores) {
                    if scores.contains_key(&node) {
                        return Some(node);
                    }
                }
            }
        }
        None
    }

    /// Whether any tier asks for node ordering; callers that only need
    /// one feasible node skip prioritization when this is off.
    pub fn prioritization_requested(&self) -> bool {
        self.tiers.iter().any(|t| {
            t.plugins
                .iter()
                .any(|p| p.option.node_order_enabled() || p.option.best_node_enabled())
        })
    }

    pub(crate) fn tiers(&self) -> impl Iterator<Item = (&PluginOption, &dyn Plugin)> {
        self.tiers
            .iter()
            .flat_map(|t| t.plugins.iter().map(|p| (&p.option, p.plugin.as_ref())))
    }

    // ---- ordered iteration --------------------------------------------------

    /// Queue ids in composed queue-order.
    pub fn sorted_queues(&self) -> Vec<QueueId> {
        let mut ids: Vec<QueueId> = self.state.queues.keys().cloned().collect();
        ids.sort_by(|a, b| {
            match (self.state.queues.get(a), self.state.queues.get(b)) {
                (Some(qa), Some(qb)) => self.queue_order(qa, qb),
                _ => Ordering::Equal,
            }
        });
        ids
    }

    /// Jobs of one queue in composed job-order, filtered on admission
    /// state: `pending` selects not-yet-admitted groups (for enqueue).
    pub fn sorted_jobs_in_queue(&self, queue_id: &QueueId, pending: bool) -> Vec<JobId> {
        let mut jobs: Vec<&JobInfo> = self
            .state
            .jobs
            .values()
            .filter(|j| &j.queue == queue_id && j.is_pending() == pending)
            .collect();
        jobs.sort_by(|a, b| self.job_order(a, b));
        jobs.iter().map(|j| j.uid.clone()).collect()
    }

    /// Pending tasks of one job in composed task-order, cloned out so
    /// callers can mutate the session while iterating.
    pub fn sorted_pending_tasks(&self, job_id: &JobId) -> Vec<TaskInfo> {
        let Some(job) = self.state.jobs.get(job_id) else {
            return Vec::new();
        };
        let mut tasks: Vec<TaskInfo> = job.pending_tasks().into_iter().cloned().collect();
        tasks.sort_by(|a, b| self.task_order(a, b));
        tasks
    }

    /// Node names in deterministic order.
    pub fn sorted_node_names(&self) -> Vec<String> {
        self.state.nodes.keys().cloned().collect()
    }
}

fn own_dim((dim, qty): (&str, f64)) -> (String, f64) {
    (dim.to_string(), qty)
}
