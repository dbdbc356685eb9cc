//! priority plugin — dispatch ordering and preemption by priority.
//!
//! Orders jobs and tasks by descending priority and restricts
//! preemption victims to tasks of strictly lower-priority jobs.

use std::cmp::Ordering;

use flotilla_api::{JobInfo, TaskId, TaskInfo};
use flotilla_framework::{Arguments, Plugin, SessionState};

pub const PLUGIN_NAME: &str = "priority";

pub struct PriorityPlugin;

pub fn new(_args: &Arguments) -> Box<dyn Plugin> {
    Box::new(PriorityPlugin)
}

impl Plugin for PriorityPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn job_order(&self, a: &JobInfo, b: &JobInfo) -> Option<Ordering> {
        Some(b.priority.cmp(&a.priority))
    }

    fn task_order(&self, a: &TaskInfo, b: &TaskInfo) -> Option<Ordering> {
        Some(b.priority.cmp(&a.priority))
    }

    fn preemptable(
        &self,
        state: &SessionState,
        preemptor: &TaskInfo,
        victims: &[TaskInfo],
    ) -> Option<Vec<TaskId>> {
        let preemptor_priority = state
            .job_of_task(&preemptor.uid)
            .map(|j| j.priority)
            .unwrap_or(preemptor.priority);

        let kept = victims
            .iter()
            .filter(|victim| {
                let victim_priority = state
                    .job_of_task(&victim.uid)
                    .map(|j| j.priority)
                    .unwrap_or(victim.priority);
                victim_priority < preemptor_priority
            })
            .map(|victim| victim.uid.clone())
            .collect();
        Some(kept)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use flotilla_api::{Resource, TaskStatus};

    use super::*;

    fn job(uid: &str, priority: i32) -> JobInfo {
        JobInfo {
            uid: uid.to_string(),
            namespace: "ns1".to_string(),
            name: uid.to_string(),
            queue: "q1".to_string(),
            priority,
            min_member: 1,
            min_resources: Resource::new(),
            creation_epoch_ms: 0,
            tasks: BTreeMap::new(),
            pending: false,
            fit_errors: BTreeMap::new(),
        }
    }

    fn task(uid: &str, priority: i32) -> TaskInfo {
        TaskInfo {
            uid: uid.to_string(),
            namespace: "ns1".to_string(),
            name: uid.to_string(),
            job: None,
            init_request: Resource::new(),
            request: Resource::new(),
            labels: BTreeMap::new(),
            node_selector: BTreeMap::new(),
            affinity: Vec::new(),
            tolerations: Vec::new(),
            priority,
            status: TaskStatus::Pending,
            node_name: None,
        }
    }

    #[test]
    fn higher_priority_jobs_sort_first() {
        let plugin = PriorityPlugin;
        let high = job("a", 100);
        let low = job("b", 10);
        assert_eq!(plugin.job_order(&high, &low), Some(Ordering::Less));
        assert_eq!(plugin.job_order(&low, &high), Some(Ordering::Greater));
        assert_eq!(plugin.job_order(&high, &high), Some(Ordering::Equal));
    }

    #[test]
    fn higher_priority_tasks_sort_first() {
        let plugin = PriorityPlugin;
        assert_eq!(
            plugin.task_order(&task("a", 5), &task("b", 1)),
            Some(Ordering::Less)
        );
    }
}
