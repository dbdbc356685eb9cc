//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur around a scheduling cycle. Any error here
/// skips the cycle; the next snapshot starts clean.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("snapshot construction failed: {0}")]
    Snapshot(#[source] anyhow::Error),

    #[error("framework error: {0}")]
    Framework(#[from] flotilla_framework::FrameworkError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
