//! preempt action — same-queue eviction for higher-priority demand.
//!
//! For pending tasks left unplaced by allocate, evicts lower-priority
//! victims within the same queue whose freed resources make the
//! preemptor fit, then pipelines the preemptor onto the node. Victims
//! are chosen cheapest-first and only as many as needed; evicted tasks
//! are not re-allocated within the session.

use tracing::{debug, info};

use flotilla_framework::{predicate_nodes, Action, PredicateMode, Session};

use crate::victims::{minimal_victim_set, running_tasks_on_node, sort_victims};

pub struct Preempt;

impl Action for Preempt {
    fn name(&self) -> &'static str {
        "preempt"
    }

    fn execute(&self, ssn: &mut Session) {
        debug!("enter preempt");

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
                    ssn.collector().record_attempts(1);

                    let (feasible, _) = predicate_nodes(ssn, &task, PredicateMode::AllFeasible);
                    for node_name in feasible {
                        // Already fits — allocate's business, not preemption's.
                        let fits_now = ssn
                            .state
                            .nodes
                            .get(&node_name)
                            .is_some_and(|n| task.request.less_equal(&n.future_idle()));
                        if fits_now {
                            continue;
                        }

                        // Preemption never crosses queue boundaries;
                        // cross-queue rebalancing is reclaim's job.
                        let candidates: Vec<_> = running_tasks_on_node(ssn, &node_name)
                            .into_iter()
                            .filter(|v| {
                                v.job != task.job
                                    && v.is_preemptable()
                                    && ssn
                                        .state
                                        .job_of_task(&v.uid)
                                        .map(|j| j.queue == *queue_id)
                                        .unwrap_or(false)
                            })
                            .collect();
                        let mut victims = ssn.preemptable(&task, &candidates);
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

                        let reason = format!("preempted by {}", task.key());
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
                                    "preempted onto node"
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

        debug!("leave preempt");
    }
}
