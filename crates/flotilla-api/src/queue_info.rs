//! Queue model — fair-sharing unit between tenants.

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// Queue identity within a snapshot.
pub type QueueId = String;

/// A queue with its capacity policy knobs.
///
/// Invariants (enforced by the snapshot provider, asserted by the
/// capacity plugin at session open): allocated ≤ capability;
/// deserved ≤ capability when both are set; guarantee ≤ deserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueInfo {
    pub uid: QueueId,
    pub name: String,
    pub weight: u32,
    /// Hard upper bound on allocatable resources. Empty means unlimited.
    pub capability: Resource,
    /// Fair-share entitlement. Empty means unset.
    pub deserved: Resource,
    /// Reserved minimum, protected from reclamation by other queues.
    pub guarantee: Resource,
}

impl QueueInfo {
    /// Capability with unset treated as unlimited: an empty capability
    /// never constrains.
    pub fn has_capability(&self) -> bool {
        !self.capability.is_empty()
    }

    pub fn has_deserved(&self) -> bool {
        !self.deserved.is_empty()
    }
}
