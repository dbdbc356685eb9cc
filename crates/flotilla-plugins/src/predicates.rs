//! predicates plugin — hard per-node feasibility.
//!
//! Checks, in order: node selector, taint toleration, the node's task
//! count limit (`pods` dimension), and required affinity/anti-affinity
//! against tasks already resident on the node. The pre-predicate
//! rejects tasks whose selector cannot match any node in the snapshot
//! at all, so the per-node fan-out is not repeated for them.

use flotilla_api::{FitError, TaskInfo, RES_PODS};
use flotilla_framework::{Arguments, NodeState, Plugin, SessionState};

pub const PLUGIN_NAME: &str = "predicates";

pub struct PredicatesPlugin;

pub fn new(_args: &Arguments) -> Box<dyn Plugin> {
    Box::new(PredicatesPlugin)
}

fn selector_matches(task: &TaskInfo, node: &NodeState) -> bool {
    task.node_selector
        .iter()
        .all(|(k, v)| node.info.labels.get(k) == Some(v))
}

impl Plugin for PredicatesPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn pre_predicate(&self, state: &SessionState, task: &TaskInfo) -> Result<(), FitError> {
        if task.node_selector.is_empty() {
            return Ok(());
        }
        if state.nodes.values().any(|n| selector_matches(task, n)) {
            Ok(())
        } else {
            Err(FitError::NodeSelectorMismatch)
        }
    }

    fn predicate(&self, task: &TaskInfo, node: &NodeState) -> Result<(), FitError> {
        if !selector_matches(task, node) {
            return Err(FitError::NodeSelectorMismatch);
        }

        for taint in &node.info.taints {
            let tolerated = task.tolerations.iter().any(|tol| {
                tol.key == taint.key
                    && tol.value.as_ref().map_or(true, |v| *v == taint.value)
            });
            if !tolerated {
                return Err(FitError::TaintNotTolerated(taint.key.clone()));
            }
        }

        let pod_limit = node.info.total.get(RES_PODS);
        if pod_limit > 0.0 && node.tasks.len() as f64 >= pod_limit {
            return Err(FitError::TooManyTasks);
        }

        for term in &task.affinity {
            let resident_match = node
                .tasks
                .values()
                .filter(|t| t.uid != task.uid && t.status.alive())
                .find(|t| term.matches(&t.labels));
            match (term.anti, resident_match) {
                (true, Some(conflict)) => {
                    return Err(FitError::AntiAffinityConflict(conflict.key()));
                }
                (false, None) => return Err(FitError::AffinityNotSatisfied),
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use flotilla_api::{
        AffinityTerm, ClusterSnapshot, NodeInfo, Resource, Taint, TaskStatus, Toleration,
    };
    use flotilla_framework::SessionState;

    use super::*;

    fn node_info(name: &str, labels: &[(&str, &str)]) -> NodeInfo {
        NodeInfo {
            name: name.to_string(),
            total: Resource::new().with("cpu", 4000.0),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            taints: Vec::new(),
            generation: 1,
        }
    }

    fn node_state(info: NodeInfo) -> NodeState {
        let mut snapshot = ClusterSnapshot::default();
        snapshot.nodes.insert(info.name.clone(), info);
        let mut state = SessionState::new(Arc::new(snapshot));
        let (_, ns) = state.nodes.pop_first().unwrap();
        ns
    }

    fn task(name: &str) -> TaskInfo {
        TaskInfo {
            uid: format!("uid-{name}"),
            namespace: "ns1".to_string(),
            name: name.to_string(),
            job: None,
            init_request: Resource::new(),
            request: Resource::new(),
            labels: BTreeMap::new(),
            node_selector: BTreeMap::new(),
            affinity: Vec::new(),
            tolerations: Vec::new(),
            priority: 0,
            status: TaskStatus::Pending,
            node_name: None,
        }
    }

    #[test]
    fn selector_must_match_node_labels() {
        let plugin = PredicatesPlugin;
        let node = node_state(node_info("n1", &[("platform", "cpu")]));

        let mut gpu_task = task("p1");
        gpu_task
            .node_selector
            .insert("platform".to_string(), "gpu".to_string());
        assert_eq!(
            plugin.predicate(&gpu_task, &node),
            Err(FitError::NodeSelectorMismatch)
        );

        let mut cpu_task = task("p2");
        cpu_task
            .node_selector
            .insert("platform".to_string(), "cpu".to_string());
        assert!(plugin.predicate(&cpu_task, &node).is_ok());
    }

    #[test]
    fn untolerated_taint_rejects() {
        let plugin = PredicatesPlugin;
        let mut info = node_info("n1", &[]);
        info.taints.push(Taint {
            key: "dedicated".to_string(),
            value: "batch".to_string(),
        });
        let node = node_state(info);

        assert!(matches!(
            plugin.predicate(&task("p1"), &node),
            Err(FitError::TaintNotTolerated(_))
        ));

        let mut tolerant = task("p2");
        tolerant.tolerations.push(Toleration {
            key: "dedicated".to_string(),
            value: None,
        });
        assert!(plugin.predicate(&tolerant, &node).is_ok());
    }

    #[test]
    fn pod_limit_caps_resident_tasks() {
        let plugin = PredicatesPlugin;
        let mut info = node_info("n1", &[]);
        info.total.set(RES_PODS, 1.0);
        let mut node = node_state(info);

        let mut resident = task("resident");
        resident.status = TaskStatus::Running;
        node.add_task(resident);

        assert_eq!(
            plugin.predicate(&task("p1"), &node),
            Err(FitError::TooManyTasks)
        );
    }

    #[test]
    fn anti_affinity_conflicts_with_resident_task() {
        let plugin = PredicatesPlugin;
        let mut node = node_state(node_info("n1", &[]));

        let mut resident = task("ps");
        resident.status = TaskStatus::Running;
        resident
            .labels
            .insert("role".to_string(), "ps".to_string());
        node.add_task(resident);

        let mut incoming = task("worker");
        incoming.affinity.push(AffinityTerm {
            label_selector: BTreeMap::from([("role".to_string(), "ps".to_string())]),
            anti: true,
        });
        assert!(matches!(
            plugin.predicate(&incoming, &node),
            Err(FitError::AntiAffinityConflict(_))
        ));

        // Positive affinity toward the same resident passes.
        let mut buddy = task("buddy");
        buddy.affinity.push(AffinityTerm {
            label_selector: BTreeMap::from([("role".to_string(), "ps".to_string())]),
            anti: false,
        });
        assert!(plugin.predicate(&buddy, &node).is_ok());
    }

    #[test]
    fn pre_predicate_catches_unmatchable_selector() {
        let mut snapshot = ClusterSnapshot::default();
        snapshot
            .nodes
            .insert("n1".to_string(), node_info("n1", &[("platform", "cpu")]));
        let state = SessionState::new(Arc::new(snapshot));

        let plugin = PredicatesPlugin;
        let mut unmatchable = task("p1");
        unmatchable
            .node_selector
            .insert("platform".to_string(), "tpu".to_string());
        assert_eq!(
            plugin.pre_predicate(&state, &unmatchable),
            Err(FitError::NodeSelectorMismatch)
        );
        assert!(plugin.pre_predicate(&state, &task("p2")).is_ok());
    }
}
