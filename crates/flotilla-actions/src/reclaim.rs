//! reclaim action — cross-queue reclamation of fair share.
//!
//! Queues below their deserved share with pending demand take resources
//! back from queues running above theirs. Victim filtering is gated by
//! the composed reclaimable function (donor must be overused and stay
//! at or above deserved afterwards); the reclaimer is pipelined onto
//! the node and binds in a later session once the victims release.

use tracing::{debug, info};

use flotilla_api::{QueueId, TaskInfo};
use flotilla_framework::{predicate_nodes, Action, PredicateMode, Session};

use crate::victims::{minimal_victim_set, running_tasks_on_node, sort_victims};

pub struct Reclaim;

/// Taking this task must keep the queue within its deserved share on
/// the requested dimensions; queues without a deserved share never
/// reclaim.
fn within_deserved(ssn: &Session, queue_id: &QueueId, task: &TaskInfo) -> bool {
    let Some(queue) = ssn.state.queues.get(queue_id) else {
        return false;
    };
    if !queue.info.has_deserved() {
        return false;
    }
    queue
        .allocated
        .plus(&task.request)
        .less_equal_with_dimension(&queue.info.deserved, &task.request)
}

impl Action for Reclaim {
    fn name(&self) -> &'static str {
        "reclaim"
    }

    fn execute(&self, ssn: &mut Session) {
        debug!("enter reclaim");

        for queue_id in ssn.sorted_queues() {
            if ssn.expired() {
                break;
            }
            for job_id in ssn.sorted_jobs_in_queue(&queue_id, false) {
                if ssn.expired() {
                    break;
                }
                for task in ssn.sorted_pending_tasks(&job_id) {
                    if ssn.expired() {
                        break;
                    }
                    if task.request.is_empty() {
                        continue;
                    }
                    if !within_deserved(ssn, &queue_id, &task) {
                        debug!(
                            task = %task.key(),
                            queue = %queue_id,
                            "queue not under-served for this request"
                        );
                        continue;
                    }
                    ssn.collector().record_attempts(1);

                    let (feasible, _) = predicate_nodes(ssn, &task, PredicateMode::AllFeasible);
                    for node_name in feasible {
                        let fits_now = ssn
                            .state
                            .nodes
                            .get(&node_name)
                            .is_some_and(|n| task.request.less_equal(&n.future_idle()));
                        if fits_now {
                            continue;
                        }

                        // Donor candidates: running tasks of other,
                        // overused queues that have not opted out of
                        // eviction and whose own gang survives losing a
                        // member.
                        let candidates: Vec<_> = running_tasks_on_node(ssn, &node_name)
                            .into_iter()
                            .filter(|v| {
                                v.is_preemptable()
                                    && ssn
                                        .state
                                        .job_of_task(&v.uid)
                                        .map(|j| {
                                            j.queue != *queue_id
                                                && j.ready_task_num() > j.min_member
                                                && ssn.overused(&j.queue)
                                        })
                                        .unwrap_or(false)
                            })
                            .collect();
                        let mut victims = ssn.reclaimable(&task, &candidates);
                        if victims.is_empty() {
                            continue;
                        }
                        sort_victims(ssn, &mut victims);

                        let Some(chosen) =
                            minimal_victim_set(ssn, &node_name, &task.request, &victims)
                        else {
                            continue;
                        };
                        if chosen.is_empty() {
                            continue;
                        }

                        let reason = format!("reclaimed by queue {queue_id}");
                        for victim in &chosen {
                            if let Err(err) = ssn.evict(&victim.uid, &reason) {
                                debug!(victim = %victim.key(), %err, "eviction failed");
                            }
                        }
                        match ssn.pipeline(&task.uid, &node_name) {
                            Ok(()) => {
                                info!(
                                    task = %task.key(),
                                    node = %node_name,
                                    victims = chosen.len(),
                                    "reclaimed onto node"
                                );
                            }
                            Err(err) => {
                                debug!(task = %task.key(), node = %node_name, %err, "pipeline failed");
                            }
                        }
                        break;
                    }
                }
            }
        }

        debug!("leave reclaim");
    }
}
