//! allocate action — fair dispatch of pending tasks to feasible nodes.
//!
//! Iterates queues in queue-order, jobs in job-order, and pending
//! tasks in task-order. Each task runs the pre-predicate, fans out the
//! composed predicate across nodes, filters survivors by idle
//! capacity, scores them, and binds to the best. Any failure is
//! recorded as a per-task fit error and never crosses task boundaries.

use tracing::{debug, warn};

use flotilla_api::{FitError, FitErrors};
use flotilla_framework::{
    pick_node, predicate_nodes, prioritize_nodes, Action, PredicateMode, Session,
};

pub struct Allocate;

impl Action for Allocate {
    fn name(&self) -> &'static str {
        "allocate"
    }

    fn execute(&self, ssn: &mut Session) {
        debug!("enter allocate");

        for queue_id in ssn.sorted_queues() {
            if ssn.expired() {
                break;
            }
            for job_id in ssn.sorted_jobs_in_queue(&queue_id, false) {
                if ssn.expired() {
                    break;
                }
                let valid = {
                    let Some(job) = ssn.state.jobs.get(&job_id) else {
                        continue;
                    };
                    ssn.job_valid(job)
                };
                if !valid.pass {
                    debug!(job = %job_id, reason = %valid.reason, "job not workable, skipping");
                    continue;
                }

                for task in ssn.sorted_pending_tasks(&job_id) {
                    if ssn.expired() {
                        break;
                    }
                    ssn.collector().record_attempts(1);

                    if !ssn.allocatable(&queue_id, &task) {
                        let mut errors = FitErrors::new();
                        errors.set_error_for_all(
                            ssn.sorted_node_names().iter().map(String::as_str),
                            FitError::QueueQuotaExhausted(queue_id.clone()),
                        );
                        ssn.record_fit_errors(&job_id, &task.uid, errors);
                        continue;
                    }

                    if let Err(err) = ssn.pre_predicate(&task) {
                        debug!(task = %task.key(), %err, "pre-predicate failed");
                        let mut errors = FitErrors::new();
                        errors.set_error_for_all(
                            ssn.sorted_node_names().iter().map(String::as_str),
                            err,
                        );
                        ssn.record_fit_errors(&job_id, &task.uid, errors);
                        continue;
                    }

                    let (feasible, mut errors) =
                        predicate_nodes(ssn, &task, PredicateMode::AllFeasible);
                    if feasible.is_empty() {
                        debug!(task = %task.key(), "predicates failed on every node");
                        ssn.record_fit_errors(&job_id, &task.uid, errors);
                        continue;
                    }

                    // Feasible by policy, but does it fit right now?
                    let candidates: Vec<String> = feasible
                        .iter()
                        .filter(|name| {
                            ssn.state
                                .nodes
                                .get(*name)
                                .is_some_and(|n| task.request.less_equal(&n.idle))
                        })
                        .cloned()
                        .collect();
                    if candidates.is_empty() {
                        for name in &feasible {
                            let deficit = ssn
                                .state
                                .nodes
                                .get(name)
                                .map(|n| task.request.fit_delta(&n.idle))
                                .unwrap_or_default();
                            let dim = deficit
                                .keys()
                                .next()
                                .cloned()
                                .unwrap_or_else(|| "resources".to_string());
                            errors.set_node_error(name, FitError::InsufficientResource(dim));
                        }
                        ssn.record_fit_errors(&job_id, &task.uid, errors);
                        continue;
                    }

                    let scores = prioritize_nodes(ssn, &task, &candidates);
                    let Some(node) = pick_node(ssn, &task, &scores) else {
                        continue;
                    };
                    if let Err(err) = ssn.allocate(&task.uid, &node) {
                        warn!(task = %task.key(), node = %node, %err, "allocation failed");
                        let mut errors = FitErrors::new();
                        errors.set_node_error(&node, FitError::Plugin(err.to_string()));
                        ssn.record_fit_errors(&job_id, &task.uid, errors);
                    }
                }
            }
        }

        debug!("leave allocate");
    }
}
