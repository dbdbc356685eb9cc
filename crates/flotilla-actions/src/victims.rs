//! Shared victim-selection mechanics for preempt and reclaim.

use flotilla_api::{Resource, TaskInfo, TaskStatus};
use flotilla_framework::Session;

/// Running, evictable tasks resident on a node, in uid order.
pub(crate) fn running_tasks_on_node(ssn: &Session, node_name: &str) -> Vec<TaskInfo> {
    let Some(node) = ssn.state.nodes.get(node_name) else {
        return Vec::new();
    };
    node.tasks
        .values()
        .filter(|t| t.status == TaskStatus::Running)
        .cloned()
        .collect()
}

/// Order victims cheapest-first: lowest job priority, then lowest task
/// priority, then uid for determinism.
pub(crate) fn sort_victims(ssn: &Session, victims: &mut [TaskInfo]) {
    victims.sort_by(|a, b| {
        let ja = ssn.state.job_of_task(&a.uid).map(|j| j.priority).unwrap_or(0);
        let jb = ssn.state.job_of_task(&b.uid).map(|j| j.priority).unwrap_or(0);
        ja.cmp(&jb)
            .then_with(|| a.priority.cmp(&b.priority))
            .then_with(|| a.uid.cmp(&b.uid))
    });
}

/// Take victims from the front until the request fits in the node's
/// future idle capacity plus what they free. Returns the minimal
/// prefix, or `None` when even the full set is not enough.
pub(crate) fn minimal_victim_set(
    ssn: &Session,
    node_name: &str,
    request: &Resource,
    victims: &[TaskInfo],
) -> Option<Vec<TaskInfo>> {
    let node = ssn.state.nodes.get(node_name)?;
    let mut available = node.future_idle();
    let mut chosen = Vec::new();

    for victim in victims {
        if request.less_equal(&available) {
            break;
        }
        available.add(&victim.request);
        chosen.push(victim.clone());
    }

    if request.less_equal(&available) {
        Some(chosen)
    } else {
        None
    }
}
