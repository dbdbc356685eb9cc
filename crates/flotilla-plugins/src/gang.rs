//! gang plugin — all-or-nothing group semantics.
//!
//! Validates that a job has enough live member tasks to ever reach its
//! threshold, prefers unready gangs in dispatch order so partially
//! scheduled groups complete first, and vetoes evictions that would
//! drop a running gang below its minimum.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use flotilla_api::{JobInfo, TaskId, TaskInfo, TaskStatus};
use flotilla_framework::{Arguments, Plugin, SessionState, ValidateResult};

pub const PLUGIN_NAME: &str = "gang";

pub struct GangPlugin;

pub fn new(_args: &Arguments) -> Box<dyn Plugin> {
    Box::new(GangPlugin)
}

/// Tasks that still could become gang members: anything not
/// terminally finished.
fn member_candidates(job: &JobInfo) -> u32 {
    job.tasks
        .values()
        .filter(|t| !matches!(t.status, TaskStatus::Succeeded | TaskStatus::Failed))
        .count() as u32
}

impl Plugin for GangPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// A job is workable only when enough member tasks exist to reach
    /// the threshold at all.
    fn job_valid(&self, job: &JobInfo) -> Option<ValidateResult> {
        let candidates = member_candidates(job);
        if candidates >= job.min_member {
            Some(ValidateResult::pass())
        } else {
            Some(ValidateResult::fail(
                "NotEnoughTasks",
                format!(
                    "job {} has {candidates} member task(s), needs {}",
                    job.key(),
                    job.min_member
                ),
            ))
        }
    }

    /// Unready gangs dispatch before ready ones, so a partially
    /// scheduled group is completed before new work starts.
    fn job_order(&self, a: &JobInfo, b: &JobInfo) -> Option<Ordering> {
        match (a.is_ready(), b.is_ready()) {
            (false, true) => Some(Ordering::Less),
            (true, false) => Some(Ordering::Greater),
            _ => Some(Ordering::Equal),
        }
    }

    /// Keep only victims whose own gang survives the eviction.
    fn preemptable(
        &self,
        state: &SessionState,
        _preemptor: &TaskInfo,
        victims: &[TaskInfo],
    ) -> Option<Vec<TaskId>> {
        let mut evicted_per_job: BTreeMap<String, u32> = BTreeMap::new();
        let mut kept = Vec::new();

        for victim in victims {
            let Some(job) = state.job_of_task(&victim.uid) else {
                continue;
            };
            let already = evicted_per_job.get(&job.uid).copied().unwrap_or(0);
            let remaining = job.ready_task_num().saturating_sub(already + 1);
            if remaining >= job.min_member {
                *evicted_per_job.entry(job.uid.clone()).or_insert(0) += 1;
                kept.push(victim.uid.clone());
            } else {
                debug!(
                    victim = %victim.key(),
                    job = %job.key(),
                    "gang veto: eviction would break the group"
                );
            }
        }
        Some(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_api::Resource;

    fn job_with(min_member: u32, statuses: &[TaskStatus]) -> JobInfo {
        let mut tasks = BTreeMap::new();
        for (i, status) in statuses.iter().enumerate() {
            let uid = format!("t{i}");
            tasks.insert(
                uid.clone(),
                TaskInfo {
                    uid,
                    namespace: "ns1".to_string(),
                    name: format!("t{i}"),
                    job: Some("j1".to_string()),
                    init_request: Resource::new(),
                    request: Resource::new(),
                    labels: BTreeMap::new(),
                    node_selector: BTreeMap::new(),
                    affinity: Vec::new(),
                    tolerations: Vec::new(),
                    priority: 0,
                    status: *status,
                    node_name: None,
                },
            );
        }
        JobInfo {
            uid: "j1".to_string(),
            namespace: "ns1".to_string(),
            name: "j1".to_string(),
            queue: "q1".to_string(),
            priority: 0,
            min_member,
            min_resources: Resource::new(),
            creation_epoch_ms: 0,
            tasks,
            pending: false,
            fit_errors: BTreeMap::new(),
        }
    }

    #[test]
    fn job_valid_counts_unfinished_members() {
        let plugin = GangPlugin;
        let enough = job_with(2, &[TaskStatus::Pending, TaskStatus::Running]);
        assert!(plugin.job_valid(&enough).is_some_and(|v| v.pass));

        let short = job_with(3, &[TaskStatus::Pending, TaskStatus::Failed]);
        let verdict = plugin.job_valid(&short);
        assert!(verdict.is_some_and(|v| !v.pass));
    }

    #[test]
    fn unready_jobs_order_before_ready_ones() {
        let plugin = GangPlugin;
        let ready = job_with(1, &[TaskStatus::Running]);
        let unready = job_with(2, &[TaskStatus::Running, TaskStatus::Pending]);
        assert_eq!(plugin.job_order(&unready, &ready), Some(Ordering::Less));
        assert_eq!(plugin.job_order(&ready, &unready), Some(Ordering::Greater));
    }
}
