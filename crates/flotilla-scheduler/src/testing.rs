//! Test construction helpers: cluster fixtures, a recording binder,
//! and a fixed snapshot provider.
//!
//! Shared by the crate's scenario tests and usable by downstream crates
//! exercising the engine against synthetic clusters.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use flotilla_api::{
    ClusterSnapshot, JobInfo, JobPhase, NodeInfo, QueueInfo, Resource, TaskInfo, TaskStatus,
};
use flotilla_framework::{Binder, BinderError};

use crate::scheduler::SnapshotProvider;

/// `"2"` cpu / `"4Gi"` memory style resource construction.
pub fn build_resource_list(cpu: &str, memory: &str) -> Resource {
    Resource::from_spec(cpu, memory).expect("valid test quantities")
}

pub fn build_node(name: &str, total: Resource, labels: &[(&str, &str)]) -> NodeInfo {
    NodeInfo {
        name: name.to_string(),
        total,
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        taints: Vec::new(),
        generation: 1,
    }
}

/// A task named `name` in namespace `ns`. Placed tasks get the node and
/// a `Running` status; pending ones stay unassigned.
#[allow(clippy::too_many_arguments)]
pub fn build_task(
    ns: &str,
    name: &str,
    node: Option<&str>,
    status: TaskStatus,
    request: Resource,
    labels: &[(&str, &str)],
    selector: &[(&str, &str)],
) -> TaskInfo {
    TaskInfo {
        uid: format!("{ns}-{name}"),
        namespace: ns.to_string(),
        name: name.to_string(),
        job: None,
        init_request: request.clone(),
        request,
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        node_selector: selector
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        affinity: Vec::new(),
        tolerations: Vec::new(),
        priority: 0,
        status,
        node_name: node.map(str::to_string),
    }
}

/// A job owning `tasks`, with `pending` mirroring the group's admission
/// state (`true` = not yet in its queue).
pub fn build_job(
    name: &str,
    ns: &str,
    queue: &str,
    min_member: u32,
    min_resources: Resource,
    pending: bool,
    tasks: Vec<TaskInfo>,
) -> JobInfo {
    let uid = format!("{ns}-{name}");
    let tasks: BTreeMap<_, _> = tasks
        .into_iter()
        .map(|mut t| {
            t.job = Some(uid.clone());
            (t.uid.clone(), t)
        })
        .collect();
    JobInfo {
        uid,
        namespace: ns.to_string(),
        name: name.to_string(),
        queue: queue.to_string(),
        priority: 0,
        min_member,
        min_resources,
        creation_epoch_ms: 0,
        tasks,
        pending,
        fit_errors: BTreeMap::new(),
    }
}

pub fn build_queue(
    name: &str,
    weight: u32,
    deserved: Option<Resource>,
    capability: Option<Resource>,
) -> QueueInfo {
    QueueInfo {
        uid: name.to_string(),
        name: name.to_string(),
        weight,
        capability: capability.unwrap_or_default(),
        deserved: deserved.unwrap_or_default(),
        guarantee: Resource::new(),
    }
}

pub fn build_snapshot(
    nodes: Vec<NodeInfo>,
    jobs: Vec<JobInfo>,
    queues: Vec<QueueInfo>,
) -> ClusterSnapshot {
    ClusterSnapshot {
        generation: 1,
        nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect(),
        jobs: jobs.into_iter().map(|j| (j.uid.clone(), j)).collect(),
        queues: queues.into_iter().map(|q| (q.uid.clone(), q)).collect(),
        priority_classes: BTreeMap::new(),
    }
}

/// Records every binder call for assertions.
#[derive(Default)]
pub struct FakeBinder {
    binds: Mutex<BTreeMap<String, String>>,
    evictions: Mutex<Vec<(String, String)>>,
    status_updates: Mutex<BTreeMap<String, JobPhase>>,
}

impl FakeBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binds(&self) -> BTreeMap<String, String> {
        self.binds.lock().clone()
    }

    pub fn evictions(&self) -> Vec<(String, String)> {
        self.evictions.lock().clone()
    }

    pub fn status_updates(&self) -> BTreeMap<String, JobPhase> {
        self.status_updates.lock().clone()
    }
}

impl Binder for FakeBinder {
    fn bind(&self, task: &TaskInfo, node: &str) -> Result<(), BinderError> {
        self.binds.lock().insert(task.key(), node.to_string());
        Ok(())
    }

    fn evict(&self, task: &TaskInfo, reason: &str) -> Result<(), BinderError> {
        self.evictions.lock().push((task.key(), reason.to_string()));
        Ok(())
    }

    fn update_job_status(&self, job: &JobInfo, phase: JobPhase) -> Result<(), BinderError> {
        self.status_updates.lock().insert(job.key(), phase);
        Ok(())
    }
}

/// Serves the same snapshot every cycle.
pub struct FixedSnapshotProvider {
    snapshot: ClusterSnapshot,
}

impl FixedSnapshotProvider {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self { snapshot }
    }
}

impl SnapshotProvider for FixedSnapshotProvider {
    fn snapshot(&self) -> anyhow::Result<ClusterSnapshot> {
        Ok(self.snapshot.clone())
    }
}
