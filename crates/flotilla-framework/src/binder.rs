//! Binder interface — how session decisions leave the engine.
//!
//! At session close the engine hands the surviving decisions to a
//! [`Binder`]: bindings (task → node), evictions (task + reason), and
//! job status updates. Implementations apply them to the external
//! cluster store and must be idempotent under retries; a failed apply
//! simply shows up unchanged in the next snapshot.

use flotilla_api::{JobInfo, JobPhase, TaskInfo};

use crate::error::BinderError;

pub trait Binder: Send + Sync {
    fn bind(&self, task: &TaskInfo, node: &str) -> Result<(), BinderError>;

    fn evict(&self, task: &TaskInfo, reason: &str) -> Result<(), BinderError>;

    fn update_job_status(&self, job: &JobInfo, phase: JobPhase) -> Result<(), BinderError>;
}
