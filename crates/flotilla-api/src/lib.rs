//! flotilla-api — data model for the flotilla scheduling engine.
//!
//! Leaf crate shared by the framework, plugins, and actions:
//!
//! - [`Resource`] — multidimensional resource vectors with saturating
//!   algebra and dimension-aware comparison
//! - [`NodeInfo`] / [`TaskInfo`] / [`JobInfo`] / [`QueueInfo`] — the
//!   snapshot entities
//! - [`ClusterSnapshot`] — the immutable per-session cluster view
//! - [`FitError`] / [`FitErrors`] — feasibility diagnostics

pub mod fit_error;
pub mod job_info;
pub mod node_info;
pub mod queue_info;
pub mod resource;
pub mod snapshot;
pub mod task_info;

pub use fit_error::{FitError, FitErrors};
pub use job_info::{JobId, JobInfo, JobPhase};
pub use node_info::{NodeInfo, Taint};
pub use queue_info::{QueueId, QueueInfo};
pub use resource::{parse_quantity, Resource, RES_CPU, RES_MEMORY, RES_PODS};
pub use snapshot::{ClusterSnapshot, PriorityClass};
pub use task_info::{
    AffinityTerm, TaskId, TaskInfo, TaskStatus, Toleration, PREEMPTABLE_LABEL,
};

use thiserror::Error;

/// Errors from constructing or parsing model values.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid quantity: {0:?}")]
    InvalidQuantity(String),
}
