//! Immutable point-in-time cluster view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::job_info::{JobId, JobInfo};
use crate::node_info::NodeInfo;
use crate::queue_info::{QueueId, QueueInfo};

/// A named priority level tasks and jobs can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityClass {
    pub name: String,
    pub value: i32,
}

/// Everything one scheduling session reads.
///
/// Built by the snapshot provider at session open and never mutated
/// afterwards; all session state lives in working copies keyed back to
/// these entities by identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Monotonically increasing across snapshots; combined with
    /// per-node generations for cache keying.
    pub generation: u64,
    pub nodes: BTreeMap<String, NodeInfo>,
    pub jobs: BTreeMap<JobId, JobInfo>,
    pub queues: BTreeMap<QueueId, QueueInfo>,
    pub priority_classes: BTreeMap<String, PriorityClass>,
}

impl ClusterSnapshot {
    /// Resolve a priority class name to its numeric value, defaulting
    /// to zero for unknown or unset classes.
    pub fn priority_of(&self, class: Option<&str>) -> i32 {
        class
            .and_then(|name| self.priority_classes.get(name))
            .map(|pc| pc.value)
            .unwrap_or(0)
    }
}
