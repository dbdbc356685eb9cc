//! Framework error types.

use thiserror::Error;

/// Errors from session construction and session operations.
#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid configuration: {0}")]
    InvalidConf(String),

    #[error("configuration parse error: {0}")]
    Conf(#[from] toml::de::Error),

    #[error("task not found in session: {0}")]
    TaskNotFound(String),

    #[error("job not found in session: {0}")]
    JobNotFound(String),

    #[error("node not found in session: {0}")]
    NodeNotFound(String),

    #[error("queue not found in session: {0}")]
    QueueNotFound(String),

    #[error("task {0} is not pending")]
    TaskNotPending(String),

    #[error("task {0} is not evictable in status {1:?}")]
    TaskNotEvictable(String, flotilla_api::TaskStatus),

    #[error("insufficient resources on node {node} for task {task}")]
    InsufficientIdle { task: String, node: String },
}

pub type FrameworkResult<T> = Result<T, FrameworkError>;

/// Errors surfaced by binder implementations. Binder failures never
/// abort a session; the next snapshot reflects whatever took effect.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BinderError {
    pub message: String,
}

impl BinderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
