//! enqueue action — admit pending job groups to their queues.

use tracing::debug;

use flotilla_framework::{Action, Session};

pub struct Enqueue;

impl Action for Enqueue {
    fn name(&self) -> &'static str {
        "enqueue"
    }

    fn execute(&self, ssn: &mut Session) {
        debug!("enter enqueue");

        for queue_id in ssn.sorted_queues() {
            if ssn.expired() {
                break;
            }
            for job_id in ssn.sorted_jobs_in_queue(&queue_id, true) {
                let admit = {
                    let Some(job) = ssn.state.jobs.get(&job_id) else {
                        continue;
                    };
                    // Groups with no admission floor enter directly.
                    job.min_resources.is_empty() || ssn.job_enqueueable(job)
                };
                if admit {
                    // A failed admission is skipped, never fatal to the rest.
                    let _ = ssn.enqueue_job(&job_id);
                } else {
                    debug!(job = %job_id, queue = %queue_id, "queue has no headroom for group");
                }
            }
        }

        debug!("leave enqueue");
    }
}
