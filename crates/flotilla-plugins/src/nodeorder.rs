//! nodeorder plugin — least-requested and binpack scoring.
//!
//! Two opposing strategies behind one plugin, blended by argument
//! weights: `leastrequested.weight` (spread; default 1) and
//! `binpack.weight` (pack; default 0). Scores are normalized to
//! 0–100 across the candidate set in the reduce step.

use std::collections::BTreeMap;

use flotilla_api::{TaskInfo, RES_PODS};
use flotilla_framework::{Arguments, NodeState, Plugin};

pub const PLUGIN_NAME: &str = "nodeorder";

pub const LEAST_REQUESTED_WEIGHT: &str = "leastrequested.weight";
pub const BINPACK_WEIGHT: &str = "binpack.weight";

pub struct NodeOrderPlugin {
    least_requested_weight: f64,
    binpack_weight: f64,
}

pub fn new(args: &Arguments) -> Box<dyn Plugin> {
    Box::new(NodeOrderPlugin {
        least_requested_weight: args.get_f64(LEAST_REQUESTED_WEIGHT).unwrap_or(1.0),
        binpack_weight: args.get_f64(BINPACK_WEIGHT).unwrap_or(0.0),
    })
}

impl NodeOrderPlugin {
    /// Average projected utilization of the node across its resource
    /// dimensions, 0.0 (empty) to 1.0 (full), were the task placed.
    fn projected_utilization(task: &TaskInfo, node: &NodeState) -> f64 {
        let mut total_ratio = 0.0;
        let mut dims = 0;
        for (dim, capacity) in node.info.total.dimensions() {
            if dim == RES_PODS || capacity <= 0.0 {
                continue;
            }
            let free_after = (node.idle.get(dim) - task.request.get(dim)).max(0.0);
            total_ratio += 1.0 - free_after / capacity;
            dims += 1;
        }
        if dims == 0 {
            0.0
        } else {
            total_ratio / dims as f64
        }
    }
}

impl Plugin for NodeOrderPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn node_order(&self, task: &TaskInfo, node: &NodeState) -> Option<f64> {
        let utilization = Self::projected_utilization(task, node);
        let least_requested = (1.0 - utilization) * 100.0;
        let binpack = utilization * 100.0;
        Some(self.least_requested_weight * least_requested + self.binpack_weight * binpack)
    }

    /// Normalize this plugin's scores to 0–100 across the candidates so
    /// its weight against other plugins is predictable.
    fn node_order_reduce(&self, _task: &TaskInfo, scores: &mut BTreeMap<String, f64>) -> bool {
        let max = scores.values().cloned().fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return false;
        }
        for score in scores.values_mut() {
            *score = *score * 100.0 / max;
        }
        true
    }
}
