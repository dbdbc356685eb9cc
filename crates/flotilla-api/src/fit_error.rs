//! Feasibility failure reasons and per-task diagnostics.

use std::collections::BTreeMap;

use thiserror::Error;

/// Why a task does not fit on a node.
///
/// Final errors cannot be resolved by waiting (the node can never match);
/// transient errors may clear in a later session as resources free up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("node selector does not match node labels")]
    NodeSelectorMismatch,

    #[error("taint {0} is not tolerated")]
    TaintNotTolerated(String),

    #[error("anti-affinity conflict with task {0}")]
    AntiAffinityConflict(String),

    #[error("no task on node satisfies affinity")]
    AffinityNotSatisfied,

    #[error("insufficient {0}")]
    InsufficientResource(String),

    #[error("node task limit reached")]
    TooManyTasks,

    #[error("queue {0} quota exhausted")]
    QueueQuotaExhausted(String),

    #[error("{0}")]
    Plugin(String),
}

impl FitError {
    /// Final rejections are recorded on the job and not retried against
    /// the same node; transient ones are expected to clear on their own.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            FitError::NodeSelectorMismatch
                | FitError::TaintNotTolerated(_)
                | FitError::AntiAffinityConflict(_)
                | FitError::AffinityNotSatisfied
        )
    }
}

/// Per-node feasibility failures for one task, collected across a
/// predicate fan-out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitErrors {
    nodes: BTreeMap<String, FitError>,
}

impl FitErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_node_error(&mut self, node: &str, err: FitError) {
        self.nodes.insert(node.to_string(), err);
    }

    /// Record the same failure for every listed node, as when a
    /// task-global precheck fails before any node is consulted.
    pub fn set_error_for_all<'a>(&mut self, nodes: impl Iterator<Item = &'a str>, err: FitError) {
        for node in nodes {
            self.nodes.insert(node.to_string(), err.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_error(&self, node: &str) -> Option<&FitError> {
        self.nodes.get(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FitError)> {
        self.nodes.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Reason → node count, for diagnostics and metrics.
    pub fn reasons(&self) -> BTreeMap<String, usize> {
        let mut reasons = BTreeMap::new();
        for err in self.nodes.values() {
            *reasons.entry(err.to_string()).or_insert(0) += 1;
        }
        reasons
    }
}

impl std::fmt::Display for FitErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reasons = self.reasons();
        let mut first = true;
        for (reason, count) in &reasons {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{count} node(s) {reason}")?;
            first = false;
        }
        if first {
            write!(f, "all nodes feasible")?;
        }
        Ok(())
    }
}
