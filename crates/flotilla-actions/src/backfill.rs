//! backfill action — opportunistic placement of zero-request tasks.
//!
//! Only tasks whose *initial* resource request is empty qualify: they
//! draw no quota, so queue capacity is never consulted. Feasibility is
//! purely predicate-driven; when node ordering is configured the
//! survivors are prioritized, otherwise the first feasible node in
//! name order wins.

use tracing::{debug, info, warn};

use flotilla_api::{FitError, FitErrors};
use flotilla_framework::{
    pick_node, predicate_nodes, prioritize_nodes, Action, PredicateMode, Session,
};

pub struct Backfill;

impl Action for Backfill {
    fn name(&self) -> &'static str {
        "backfill"
    }

    fn execute(&self, ssn: &mut Session) {
        debug!("enter backfill");

        let job_ids: Vec<_> = ssn.state.jobs.keys().cloned().collect();
        for job_id in job_ids {
            if ssn.expired() {
                break;
            }
            let valid = {
                let Some(job) = ssn.state.jobs.get(&job_id) else {
                    continue;
                };
                if job.is_pending() {
                    continue;
                }
                ssn.job_valid(job)
            };
            if !valid.pass {
                debug!(job = %job_id, reason = %valid.reason, "job skips backfill");
                continue;
            }

            for task in ssn.sorted_pending_tasks(&job_id) {
                if !task.init_request.is_empty() {
                    continue;
                }
                if ssn.expired() {
                    break;
                }
                ssn.collector().record_attempts(1);

                if let Err(err) = ssn.pre_predicate(&task) {
                    debug!(task = %task.key(), %err, "pre-predicate failed");
                    let mut errors = FitErrors::new();
                    errors.set_error_for_all(
                        ssn.sorted_node_names().iter().map(String::as_str),
                        err,
                    );
                    ssn.record_fit_errors(&job_id, &task.uid, errors);
                    break;
                }

                let mode = if ssn.prioritization_requested() {
                    PredicateMode::AllFeasible
                } else {
                    PredicateMode::FirstFeasible
                };
                let (feasible, errors) = predicate_nodes(ssn, &task, mode);
                if feasible.is_empty() {
                    debug!(task = %task.key(), "predicates failed on every node");
                    ssn.record_fit_errors(&job_id, &task.uid, errors);
                    break;
                }

                let node = if feasible.len() > 1 {
                    let scores = prioritize_nodes(ssn, &task, &feasible);
                    pick_node(ssn, &task, &scores).unwrap_or_else(|| feasible[0].clone())
                } else {
                    feasible[0].clone()
                };

                info!(task = %task.key(), node = %node, "backfilling task");
                if let Err(err) = ssn.allocate(&task.uid, &node) {
                    warn!(task = %task.key(), node = %node, %err, "backfill bind failed");
                    let mut errors = FitErrors::new();
                    errors.set_node_error(&node, FitError::Plugin(err.to_string()));
                    ssn.record_fit_errors(&job_id, &task.uid, errors);
                    continue;
                }
            }
        }

        debug!("leave backfill");
    }
}
