//! Node model — capacity, labels, taints, resident tasks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// A scheduling-relevant node taint. Tasks must tolerate every taint on
/// a node to land there (NoSchedule semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub value: String,
}

/// Point-in-time description of one node, as delivered by the snapshot
/// provider. Mutable accounting lives in the session's working copy,
/// never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    /// Total allocatable capacity.
    pub total: Resource,
    pub labels: BTreeMap<String, String>,
    pub taints: Vec<Taint>,
    /// Bumped by the snapshot provider whenever any attribute a
    /// predicate might read changes. Part of the predicate cache key.
    pub generation: u64,
}
