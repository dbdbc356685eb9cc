//! Session working state — mutable overlay over the immutable snapshot.
//!
//! The snapshot is shared read-only; every mutation a session makes
//! lands in the working copies here, keyed by entity identity. Commit
//! materializes them into binder calls, rollback rewinds them, and the
//! snapshot itself is never touched.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use flotilla_api::{
    ClusterSnapshot, FitError, JobId, JobInfo, NodeInfo, QueueId, QueueInfo, Resource, TaskId,
    TaskInfo, TaskStatus,
};

/// Per-node working state: the immutable node description plus the
/// session's resource accounting and resident task set.
pub struct NodeState {
    pub info: NodeInfo,
    /// Unclaimed capacity. Invariant: `idle + used = total`.
    pub idle: Resource,
    /// Claimed by alive tasks (Bound, Running, Releasing).
    pub used: Resource,
    /// Held by tasks marked for release; free once the runtime confirms.
    pub releasing: Resource,
    /// Reserved by tasks pipelined this session against `releasing`.
    pub pipelined: Resource,
    /// Tasks on this node, including session-tentative placements.
    pub tasks: BTreeMap<TaskId, TaskInfo>,
    /// Session-local generation: starts at the snapshot's node
    /// generation and bumps on every mutation, invalidating cached
    /// predicate results.
    generation: u64,
    /// Feasibility results keyed by `(task fingerprint, generation)`.
    /// Concurrent inserts of the same key carry identical results, so
    /// last-writer-wins is safe.
    pub predicate_cache: DashMap<(u64, u64), Option<FitError>>,
}

impl NodeState {
    fn new(info: NodeInfo) -> Self {
        let idle = info.total.clone();
        let generation = info.generation;
        Self {
            info,
            idle,
            used: Resource::new(),
            releasing: Resource::new(),
            pipelined: Resource::new(),
            tasks: BTreeMap::new(),
            generation,
            predicate_cache: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Capacity that will be free once releasing tasks are gone, net of
    /// reservations already pipelined against it.
    pub fn future_idle(&self) -> Resource {
        self.idle.plus(&self.releasing).minus(&self.pipelined)
    }

    /// Place a task on this node, adjusting accounting by status.
    pub fn add_task(&mut self, task: TaskInfo) {
        match task.status {
            TaskStatus::Pipelined => self.pipelined.add(&task.request),
            status if status.alive() => {
                self.idle.sub(&task.request);
                self.used.add(&task.request);
                if status == TaskStatus::Releasing {
                    self.releasing.add(&task.request);
                }
            }
            _ => {}
        }
        self.generation += 1;
        self.tasks.insert(task.uid.clone(), task);
    }

    /// Remove a task, reversing [`add_task`](Self::add_task) accounting.
    pub fn remove_task(&mut self, uid: &TaskId) -> Option<TaskInfo> {
        let task = self.tasks.remove(uid)?;
        match task.status {
            TaskStatus::Pipelined => self.pipelined.sub(&task.request),
            status if status.alive() => {
                self.idle.add(&task.request);
                self.used.sub(&task.request);
                if status == TaskStatus::Releasing {
                    self.releasing.sub(&task.request);
                }
            }
            _ => {}
        }
        self.generation += 1;
        Some(task)
    }

    /// Flip a resident task into `Releasing`, crediting `releasing`.
    pub fn release_task(&mut self, uid: &TaskId) {
        if let Some(task) = self.tasks.get_mut(uid) {
            if task.status.alive() && task.status != TaskStatus::Releasing {
                task.status = TaskStatus::Releasing;
                self.releasing.add(&task.request);
                self.generation += 1;
            }
        }
    }

    /// Undo [`release_task`](Self::release_task), restoring the given status.
    pub fn unrelease_task(&mut self, uid: &TaskId, status: TaskStatus) {
        if let Some(task) = self.tasks.get_mut(uid) {
            if task.status == TaskStatus::Releasing {
                task.status = status;
                self.releasing.sub(&task.request);
                self.generation += 1;
            }
        }
    }
}

/// Per-queue working state: the queue description plus the session's
/// running allocation tally.
pub struct QueueState {
    pub info: QueueInfo,
    /// Sum of requests of alive and pipelined tasks across the queue's
    /// jobs. Invariant: `allocated ≤ capability`.
    pub allocated: Resource,
}

/// The complete mutable state of one session.
pub struct SessionState {
    pub snapshot: Arc<ClusterSnapshot>,
    pub nodes: BTreeMap<String, NodeState>,
    pub jobs: BTreeMap<JobId, JobInfo>,
    pub queues: BTreeMap<QueueId, QueueState>,
    /// Task → owning job, for O(log n) task lookup in session ops.
    pub task_index: BTreeMap<TaskId, JobId>,
}

impl SessionState {
    /// Build working copies from a snapshot: node task sets and
    /// idle/used tallies are derived from the jobs' task placements,
    /// queue allocations from alive task requests.
    pub fn new(snapshot: Arc<ClusterSnapshot>) -> Self {
        let mut nodes: BTreeMap<String, NodeState> = snapshot
            .nodes
            .values()
            .map(|n| (n.name.clone(), NodeState::new(n.clone())))
            .collect();

        let mut queues: BTreeMap<QueueId, QueueState> = snapshot
            .queues
            .values()
            .map(|q| {
                (
                    q.uid.clone(),
                    QueueState {
                        info: q.clone(),
                        allocated: Resource::new(),
                    },
                )
            })
            .collect();

        let jobs: BTreeMap<JobId, JobInfo> = snapshot.jobs.clone();
        let mut task_index = BTreeMap::new();

        for job in jobs.values() {
            for task in job.tasks.values() {
                task_index.insert(task.uid.clone(), job.uid.clone());
                if let (Some(node_name), true) = (&task.node_name, task.status.alive()) {
                    if let Some(node) = nodes.get_mut(node_name) {
                        node.add_task(task.clone());
                    }
                }
                if task.status.alive() && !job.is_pending() {
                    if let Some(queue) = queues.get_mut(&job.queue) {
                        queue.allocated.add(&task.request);
                    }
                }
            }
        }

        Self {
            snapshot,
            nodes,
            jobs,
            queues,
            task_index,
        }
    }

    pub fn job_of_task(&self, uid: &TaskId) -> Option<&JobInfo> {
        self.jobs.get(self.task_index.get(uid)?)
    }

    /// The queue a task's job belongs to, if any.
    pub fn queue_of_task(&self, uid: &TaskId) -> Option<&QueueState> {
        self.queues.get(&self.job_of_task(uid)?.queue)
    }
}
