//! capacity plugin — per-queue capability, deserved share, guarantee.
//!
//! At session open the plugin folds the cluster total and every
//! queue's guarantee into a per-queue *real capability*: the configured
//! hard cap, further bounded so no queue can grow into the guaranteed
//! reservations of its siblings. Admission and allocation checks are
//! dimension-aware: a request is only compared on the dimensions it
//! actually asks for.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use flotilla_api::{JobInfo, QueueId, Resource, TaskId, TaskInfo};
use flotilla_framework::{Arguments, Plugin, QueueState, SessionState};

pub const PLUGIN_NAME: &str = "capacity";

/// Per-queue attributes precomputed at session open.
#[derive(Debug, Clone, Default)]
struct QueueAttr {
    /// Capability clamped by what the cluster can actually give this
    /// queue once sibling guarantees are honored.
    real_capability: Resource,
    deserved: Resource,
}

#[derive(Default)]
pub struct CapacityPlugin {
    attrs: BTreeMap<QueueId, QueueAttr>,
}

pub fn new(_args: &Arguments) -> Box<dyn Plugin> {
    Box::<CapacityPlugin>::default()
}

/// Dimension-wise minimum over the union of dimensions present in `a`.
fn min_res(a: &Resource, b: &Resource) -> Resource {
    let mut out = Resource::new();
    for (dim, qty) in a.dimensions() {
        out.set(dim, qty.min(b.get(dim)));
    }
    out
}

impl CapacityPlugin {
    fn attr(&self, queue: &QueueState) -> Option<&QueueAttr> {
        self.attrs.get(&queue.info.uid)
    }
}

impl Plugin for CapacityPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn on_session_open(&mut self, state: &SessionState) {
        let mut cluster_total = Resource::new();
        for node in state.nodes.values() {
            cluster_total.add(&node.info.total);
        }
        let mut total_guarantee = Resource::new();
        for queue in state.queues.values() {
            total_guarantee.add(&queue.info.guarantee);
        }

        for queue in state.queues.values() {
            let info = &queue.info;
            if info.has_deserved() && !info.guarantee.less_equal(&info.deserved) {
                warn!(queue = %info.name, "queue guarantee exceeds deserved share");
            }

            // Headroom left for this queue once every other queue's
            // guarantee is carved out of the cluster.
            let shareable = cluster_total
                .minus(&total_guarantee)
                .plus(&info.guarantee);
            let real_capability = if info.has_capability() {
                min_res(&info.capability, &shareable)
            } else {
                shareable
            };
            let deserved = if info.has_deserved() {
                min_res(&info.deserved, &real_capability)
            } else {
                Resource::new()
            };

            debug!(
                queue = %info.name,
                %real_capability,
                %deserved,
                allocated = %queue.allocated,
                "computed queue attributes"
            );
            self.attrs.insert(
                info.uid.clone(),
                QueueAttr {
                    real_capability,
                    deserved,
                },
            );
        }
    }

    /// `allocated + request ≤ capability`, each requested dimension
    /// independently.
    fn allocatable(&self, queue: &QueueState, task: &TaskInfo) -> Option<bool> {
        let attr = self.attr(queue)?;
        let future = queue.allocated.plus(&task.request);
        let fits = future.less_equal_with_dimension(&attr.real_capability, &task.request);
        if !fits {
            debug!(
                queue = %queue.info.name,
                task = %task.key(),
                allocated = %queue.allocated,
                "task exceeds queue capability"
            );
        }
        Some(fits)
    }

    /// Admission headroom for the group's minimum aggregate resources,
    /// against both the deserved share and the real capability.
    fn job_enqueueable(
        &self,
        _state: &SessionState,
        queue: &QueueState,
        job: &JobInfo,
    ) -> Option<bool> {
        let attr = self.attr(queue)?;
        if job.min_resources.is_empty() {
            return Some(true);
        }
        let future = queue.allocated.plus(&job.min_resources);
        if !future.less_equal_with_dimension(&attr.real_capability, &job.min_resources) {
            return Some(false);
        }
        if !attr.deserved.is_empty()
            && !future.less_equal_with_dimension(&attr.deserved, &job.min_resources)
        {
            return Some(false);
        }
        Some(true)
    }

    /// Over deserved on any dimension.
    fn overused(&self, queue: &QueueState) -> Option<bool> {
        let attr = self.attr(queue)?;
        if attr.deserved.is_empty() {
            return Some(false);
        }
        Some(!queue.allocated.less_equal(&attr.deserved))
    }

    /// Victims must come from overused donor queues, and reclaiming
    /// them must not push the donor below its deserved share.
    fn reclaimable(
        &self,
        state: &SessionState,
        reclaimer: &TaskInfo,
        victims: &[TaskInfo],
    ) -> Option<Vec<TaskId>> {
        let reclaimer_queue = state
            .job_of_task(&reclaimer.uid)
            .map(|j| j.queue.clone())?;

        // Simulate donor allocations shrinking as victims are accepted,
        // so a run of victims from one donor cannot overshoot.
        let mut simulated: BTreeMap<QueueId, Resource> = BTreeMap::new();
        let mut kept = Vec::new();
        for victim in victims {
            let Some(job) = state.job_of_task(&victim.uid) else {
                continue;
            };
            if job.queue == reclaimer_queue {
                continue;
            }
            let Some(queue) = state.queues.get(&job.queue) else {
                continue;
            };
            let Some(attr) = self.attrs.get(&job.queue) else {
                continue;
            };
            if attr.deserved.is_empty() {
                continue;
            }
            let allocated = simulated
                .entry(job.queue.clone())
                .or_insert_with(|| queue.allocated.clone());
            // Donor must be overused now and stay at or above deserved
            // after giving this victim up.
            if !allocated.less_equal(&attr.deserved) {
                let after = allocated.minus(&victim.request);
                if attr.deserved.less_equal(&after) {
                    *allocated = after;
                    kept.push(victim.uid.clone());
                }
            }
        }
        Some(kept)
    }

    /// Same-queue, strictly lower priority, and never a task that
    /// opted out via the non-preemptable label.
    fn preemptable(
        &self,
        state: &SessionState,
        preemptor: &TaskInfo,
        victims: &[TaskInfo],
    ) -> Option<Vec<TaskId>> {
        let preemptor_job = state.job_of_task(&preemptor.uid)?;
        let kept = victims
            .iter()
            .filter(|victim| {
                if !victim.is_preemptable() {
                    return false;
                }
                let Some(victim_job) = state.job_of_task(&victim.uid) else {
                    return false;
                };
                victim_job.queue == preemptor_job.queue
                    && victim_job.priority < preemptor_job.priority
            })
            .map(|victim| victim.uid.clone())
            .collect();
        Some(kept)
    }

    /// Heavier queues first.
    fn queue_order(&self, a: &QueueState, b: &QueueState) -> Option<std::cmp::Ordering> {
        Some(b.info.weight.cmp(&a.info.weight))
    }
}
