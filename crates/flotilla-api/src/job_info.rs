//! Job model — a gang-scheduled group of tasks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fit_error::FitErrors;
use crate::resource::Resource;
use crate::task_info::{TaskId, TaskInfo, TaskStatus};

/// Job identity within a snapshot.
pub type JobId = String;

/// Group-level phase reported back to the store at session close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPhase {
    /// Group exists but has not been admitted to its queue.
    Pending,
    /// Admitted to its queue, competing for resources.
    Inqueue,
    /// Gang threshold met.
    Running,
}

/// A task group with all-or-nothing scheduling semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub uid: JobId,
    pub namespace: String,
    pub name: String,
    pub queue: String,
    pub priority: i32,
    /// Gang threshold: the job only keeps allocations from a session in
    /// which at least this many members end up scheduled.
    pub min_member: u32,
    /// Minimum aggregate resources required to admit the group.
    pub min_resources: Resource,
    /// Creation time, milliseconds since the epoch. Drives the e2e
    /// scheduling latency metric and ordering tie-breaks.
    pub creation_epoch_ms: u64,
    pub tasks: BTreeMap<TaskId, TaskInfo>,
    /// Group not yet admitted to its queue.
    pub pending: bool,
    /// Per-task feasibility diagnostics from the last attempt.
    #[serde(skip)]
    pub fit_errors: BTreeMap<TaskId, FitErrors>,
}

impl JobInfo {
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Members currently counting toward the gang threshold.
    pub fn ready_task_num(&self) -> u32 {
        self.tasks
            .values()
            .filter(|t| t.status.scheduled())
            .count() as u32
    }

    /// Gang invariant: enough members scheduled to keep this session's
    /// allocations.
    pub fn is_ready(&self) -> bool {
        self.ready_task_num() >= self.min_member
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.tasks
            .values()
            .any(|t| t.status == TaskStatus::Pending)
    }

    /// Pending tasks in uid order. Callers re-sort with the session's
    /// composed task ordering.
    pub fn pending_tasks(&self) -> Vec<&TaskInfo> {
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .collect()
    }

    pub fn tasks_in(&self, status: TaskStatus) -> impl Iterator<Item = &TaskInfo> {
        self.tasks.values().filter(move |t| t.status == status)
    }

    /// The phase this job should be reported in, derived from admission
    /// and member counts.
    pub fn phase(&self) -> JobPhase {
        if self.pending {
            JobPhase::Pending
        } else if self.is_ready() && self.ready_task_num() > 0 {
            JobPhase::Running
        } else {
            JobPhase::Inqueue
        }
    }
}
