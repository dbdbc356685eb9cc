//! Task model — the schedulable unit.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// Task identity within a snapshot.
pub type TaskId = String;

/// Label that vetoes eviction of a task when set to `"false"`.
pub const PREEMPTABLE_LABEL: &str = "flotilla.sh/preemptable";

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not placed anywhere.
    Pending,
    /// Reserved on a node this session, awaiting victim release.
    Pipelined,
    /// Tentatively or durably bound to a node, not yet running.
    Bound,
    Running,
    /// Marked for release; resources still held until the runtime confirms.
    Releasing,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Whether a task in this status occupies node resources.
    pub fn alive(self) -> bool {
        matches!(
            self,
            TaskStatus::Bound | TaskStatus::Running | TaskStatus::Releasing
        )
    }

    /// Whether this status counts toward a job's gang threshold.
    pub fn scheduled(self) -> bool {
        matches!(
            self,
            TaskStatus::Pipelined | TaskStatus::Bound | TaskStatus::Running
        )
    }
}

/// A required co-location constraint against tasks already on a node.
///
/// With `anti` set, a node hosting a matching task is infeasible;
/// otherwise a node is feasible only if it hosts a matching task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffinityTerm {
    pub label_selector: BTreeMap<String, String>,
    pub anti: bool,
}

impl AffinityTerm {
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.label_selector
            .iter()
            .all(|(k, v)| labels.get(k) == Some(v))
    }
}

/// Tolerates a node taint with the given key (and value, when set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toleration {
    pub key: String,
    pub value: Option<String>,
}

/// A single schedulable task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub uid: TaskId,
    pub namespace: String,
    pub name: String,
    /// Owning job, if any.
    pub job: Option<String>,
    /// Resource request as admitted. Backfill only considers tasks where
    /// this is empty.
    pub init_request: Resource,
    /// Current request; may shrink while a preemption is considered.
    pub request: Resource,
    pub labels: BTreeMap<String, String>,
    pub node_selector: BTreeMap<String, String>,
    pub affinity: Vec<AffinityTerm>,
    pub tolerations: Vec<Toleration>,
    pub priority: i32,
    pub status: TaskStatus,
    /// Assigned node. Set iff status is not `Pending`.
    pub node_name: Option<String>,
}

impl TaskInfo {
    /// `namespace/name`, the human-facing identity used in logs and
    /// binder calls.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Whether eviction of this task is permitted at all.
    pub fn is_preemptable(&self) -> bool {
        self.labels.get(PREEMPTABLE_LABEL).map(String::as_str) != Some("false")
    }

    /// Hash of every attribute a predicate may read.
    ///
    /// Combined with a node generation this keys the per-node predicate
    /// cache: two tasks with equal fingerprints are interchangeable for
    /// feasibility purposes.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for (dim, qty) in self.request.dimensions() {
            dim.hash(&mut hasher);
            qty.to_bits().hash(&mut hasher);
        }
        self.node_selector.hash(&mut hasher);
        for term in &self.affinity {
            term.label_selector.hash(&mut hasher);
            term.anti.hash(&mut hasher);
        }
        for tol in &self.tolerations {
            tol.key.hash(&mut hasher);
            tol.value.hash(&mut hasher);
        }
        hasher.finish()
    }
}
