//! End-to-end scheduling scenarios against synthetic clusters.

use std::sync::Arc;
use std::time::Duration;

use flotilla_api::{JobPhase, Resource, TaskStatus, PREEMPTABLE_LABEL, RES_CPU};
use flotilla_framework::{PluginOption, Tier};
use flotilla_scheduler::testing::{
    build_job, build_node, build_queue, build_resource_list, build_snapshot, build_task,
    FakeBinder, FixedSnapshotProvider,
};
use flotilla_scheduler::{Scheduler, SchedulerConf};

fn engine(
    snapshot: flotilla_api::ClusterSnapshot,
    conf: SchedulerConf,
) -> (Scheduler, Arc<FakeBinder>) {
    let binder = Arc::new(FakeBinder::new());
    let provider = Arc::new(FixedSnapshotProvider::new(snapshot));
    let scheduler =
        Scheduler::new(conf, provider, binder.clone()).expect("valid configuration");
    (scheduler, binder)
}

fn no_resources() -> Resource {
    Resource::new()
}

#[test]
fn node_selector_routes_tasks_to_matching_nodes() {
    let snapshot = build_snapshot(
        vec![
            build_node("n1", build_resource_list("2", "4Gi"), &[("platform", "cpu")]),
            build_node("n2", build_resource_list("2", "4Gi"), &[("platform", "gpu")]),
        ],
        vec![build_job(
            "pg1",
            "c1",
            "c1",
            0,
            no_resources(),
            false,
            vec![
                build_task(
                    "c1",
                    "p1",
                    None,
                    TaskStatus::Pending,
                    no_resources(),
                    &[],
                    &[("platform", "cpu")],
                ),
                build_task(
                    "c1",
                    "p2",
                    None,
                    TaskStatus::Pending,
                    no_resources(),
                    &[],
                    &[("platform", "gpu")],
                ),
            ],
        )],
        vec![build_queue("c1", 1, None, None)],
    );

    let (scheduler, binder) = engine(snapshot, SchedulerConf::default());
    let result = scheduler.run_once().expect("cycle runs");

    let binds = binder.binds();
    assert_eq!(binds.get("c1/p1").map(String::as_str), Some("n1"));
    assert_eq!(binds.get("c1/p2").map(String::as_str), Some("n2"));
    assert_eq!(binds.len(), 2);
    assert!(result.evictions.is_empty());
}

#[test]
fn queue_capability_blocks_new_bindings() {
    let snapshot = build_snapshot(
        vec![
            build_node("n1", build_resource_list("2", "4Gi"), &[]),
            build_node("n2", build_resource_list("2", "4Gi"), &[]),
        ],
        vec![
            build_job(
                "pg1",
                "ns1",
                "q1",
                1,
                no_resources(),
                false,
                vec![build_task(
                    "ns1",
                    "p1",
                    Some("n1"),
                    TaskStatus::Running,
                    build_resource_list("1", "1Gi"),
                    &[],
                    &[],
                )],
            ),
            build_job(
                "pg2",
                "ns1",
                "q1",
                1,
                no_resources(),
                false,
                vec![build_task(
                    "ns1",
                    "p2",
                    None,
                    TaskStatus::Pending,
                    build_resource_list("1", "1Gi"),
                    &[],
                    &[],
                )],
            ),
        ],
        vec![build_queue(
            "q1",
            1,
            None,
            Some(build_resource_list("1.5", "1.5Gi")),
        )],
    );

    let (scheduler, binder) = engine(snapshot, SchedulerConf::default());
    let result = scheduler.run_once().expect("cycle runs");

    assert!(binder.binds().is_empty());
    assert!(binder.evictions().is_empty());
    assert!(result.pipelined.is_empty());
}

#[test]
fn one_small_node_serves_the_heavier_queue_first() {
    let snapshot = build_snapshot(
        vec![build_node("n1", build_resource_list("1", "2Gi"), &[])],
        vec![
            build_job(
                "pg1",
                "c1",
                "c1",
                1,
                no_resources(),
                false,
                vec![build_task(
                    "c1",
                    "p1",
                    None,
                    TaskStatus::Pending,
                    build_resource_list("1", "1Gi"),
                    &[],
                    &[],
                )],
            ),
            build_job(
                "pg2",
                "c1",
                "c2",
                1,
                no_resources(),
                false,
                vec![build_task(
                    "c1",
                    "p2",
                    None,
                    TaskStatus::Pending,
                    build_resource_list("1", "1Gi"),
                    &[],
                    &[],
                )],
            ),
        ],
        vec![
            build_queue("c1", 2, None, None),
            build_queue("c2", 1, None, None),
        ],
    );

    let (scheduler, binder) = engine(snapshot, SchedulerConf::default());
    scheduler.run_once().expect("cycle runs");

    let binds = binder.binds();
    assert_eq!(binds.len(), 1);
    assert_eq!(binds.get("c1/p1").map(String::as_str), Some("n1"));
}

#[test]
fn reclaim_evicts_overused_donor_and_pipelines_reclaimer() {
    let protected = build_task(
        "ns1",
        "p5",
        Some("n1"),
        TaskStatus::Running,
        build_resource_list("2", "4Gi"),
        &[(PREEMPTABLE_LABEL, "false")],
        &[],
    );

    let snapshot = build_snapshot(
        vec![
            build_node("n1", build_resource_list("2", "4Gi"), &[]),
            build_node("n2", build_resource_list("2", "4Gi"), &[]),
        ],
        vec![
            build_job(
                "pg5",
                "ns1",
                "q3",
                1,
                no_resources(),
                false,
                vec![
                    protected,
                    build_task(
                        "ns1",
                        "p6",
                        Some("n2"),
                        TaskStatus::Running,
                        build_resource_list("2", "4Gi"),
                        &[],
                        &[],
                    ),
                ],
            ),
            build_job(
                "pg6",
                "ns1",
                "q4",
                1,
                no_resources(),
                false,
                vec![build_task(
                    "ns1",
                    "p7",
                    None,
                    TaskStatus::Pending,
                    build_resource_list("2", "4Gi"),
                    &[],
                    &[],
                )],
            ),
        ],
        vec![
            build_queue("q3", 1, Some(build_resource_list("2", "4Gi")), None),
            build_queue("q4", 1, Some(build_resource_list("2", "4Gi")), None),
        ],
    );

    let (scheduler, binder) = engine(snapshot, SchedulerConf::default());
    let result = scheduler.run_once().expect("cycle runs");

    let evictions = binder.evictions();
    assert_eq!(evictions.len(), 1);
    assert_eq!(evictions[0].0, "ns1/p6");
    assert_eq!(
        result.pipelined.get("ns1/p7").map(String::as_str),
        Some("n2")
    );
    assert!(binder.binds().is_empty());
}

#[test]
fn enqueue_gating_is_dimension_aware() {
    // q1 is over its deserved memory but has cpu headroom; a cpu-only
    // group still enters and allocates. q2 is over on cpu; a
    // memory-only group does the same. A group needing both stays out.
    let nodes = vec![
        build_node("n1", build_resource_list("3", "3G"), &[]),
        build_node("n2", build_resource_list("3", "3G"), &[]),
    ];
    let running = vec![
        build_job(
            "pg1",
            "ns1",
            "q1",
            1,
            build_resource_list("1", "3G"),
            false,
            vec![build_task(
                "ns1",
                "pod1",
                Some("n1"),
                TaskStatus::Running,
                build_resource_list("1", "3G"),
                &[],
                &[],
            )],
        ),
        build_job(
            "pg2",
            "ns1",
            "q2",
            1,
            build_resource_list("3", "1G"),
            false,
            vec![build_task(
                "ns1",
                "pod2",
                Some("n2"),
                TaskStatus::Running,
                build_resource_list("3", "1G"),
                &[],
                &[],
            )],
        ),
    ];
    let queues = vec![
        build_queue(
            "q1",
            1,
            Some(build_resource_list("2", "2G")),
            Some(build_resource_list("2", "2G")),
        ),
        build_queue(
            "q2",
            1,
            Some(build_resource_list("2", "2G")),
            Some(build_resource_list("3", "3G")),
        ),
    ];

    // Case 0: cpu-only job into the memory-overused q1.
    let mut jobs = running.clone();
    jobs.push(build_job(
        "pg3",
        "ns1",
        "q1",
        1,
        build_resource_list("1", "0G"),
        true,
        vec![build_task(
            "ns1",
            "pod3",
            None,
            TaskStatus::Pending,
            build_resource_list("1", "0G"),
            &[],
            &[],
        )],
    ));
    let (scheduler, binder) = engine(
        build_snapshot(nodes.clone(), jobs, queues.clone()),
        SchedulerConf::default(),
    );
    scheduler.run_once().expect("cycle runs");
    assert_eq!(
        binder.binds().get("ns1/pod3").map(String::as_str),
        Some("n1")
    );
    assert_eq!(binder.binds().len(), 1);

    // Case 1: memory-only job into the cpu-overused q2.
    let mut jobs = running.clone();
    jobs.push(build_job(
        "pg4",
        "ns1",
        "q2",
        1,
        build_resource_list("0", "1G"),
        true,
        vec![build_task(
            "ns1",
            "pod4",
            None,
            TaskStatus::Pending,
            build_resource_list("0", "1G"),
            &[],
            &[],
        )],
    ));
    let (scheduler, binder) = engine(
        build_snapshot(nodes.clone(), jobs, queues.clone()),
        SchedulerConf::default(),
    );
    scheduler.run_once().expect("cycle runs");
    assert_eq!(
        binder.binds().get("ns1/pod4").map(String::as_str),
        Some("n2")
    );

    // Case 2: a job needing both dimensions cannot enter q1.
    let mut jobs = running.clone();
    jobs.push(build_job(
        "pg5",
        "ns1",
        "q1",
        1,
        build_resource_list("1", "1G"),
        true,
        vec![build_task(
            "ns1",
            "pod5",
            None,
            TaskStatus::Pending,
            build_resource_list("1", "1G"),
            &[],
            &[],
        )],
    ));
    let (scheduler, binder) = engine(
        build_snapshot(nodes, jobs, queues),
        SchedulerConf::default(),
    );
    let result = scheduler.run_once().expect("cycle runs");
    assert!(binder.binds().is_empty());
    assert!(!result.status_updates.contains_key("ns1/pg5"));
}

#[test]
fn backfill_places_only_zero_request_tasks() {
    let snapshot = build_snapshot(
        vec![
            build_node("n1", build_resource_list("2", "4Gi"), &[("platform", "cpu")]),
            build_node("n2", build_resource_list("2", "4Gi"), &[("platform", "gpu")]),
        ],
        vec![build_job(
            "pg1",
            "c1",
            "c1",
            0,
            no_resources(),
            false,
            vec![
                build_task(
                    "c1",
                    "p1",
                    None,
                    TaskStatus::Pending,
                    no_resources(),
                    &[],
                    &[("platform", "cpu")],
                ),
                build_task(
                    "c1",
                    "p2",
                    None,
                    TaskStatus::Pending,
                    build_resource_list("1", "1Gi"),
                    &[],
                    &[],
                ),
            ],
        )],
        vec![build_queue("c1", 1, None, None)],
    );

    let conf = SchedulerConf {
        actions: "backfill".to_string(),
        ..SchedulerConf::default()
    };
    let (scheduler, binder) = engine(snapshot, conf);
    scheduler.run_once().expect("cycle runs");

    let binds = binder.binds();
    // Only the zero-request task is backfilled; the resourceful one is
    // left for allocate in a fuller pipeline.
    assert_eq!(binds.get("c1/p1").map(String::as_str), Some("n1"));
    assert_eq!(binds.len(), 1);
}

#[test]
fn same_queue_preemption_evicts_cheapest_victim() {
    let mut low = build_job(
        "jlow",
        "ns1",
        "q1",
        1,
        no_resources(),
        false,
        vec![
            build_task(
                "ns1",
                "v1",
                Some("n1"),
                TaskStatus::Running,
                build_resource_list("2", "4Gi"),
                &[],
                &[],
            ),
            build_task(
                "ns1",
                "v2",
                Some("n2"),
                TaskStatus::Running,
                build_resource_list("2", "4Gi"),
                &[],
                &[],
            ),
        ],
    );
    low.priority = 0;
    let mut high = build_job(
        "jhigh",
        "ns1",
        "q1",
        1,
        no_resources(),
        false,
        vec![build_task(
            "ns1",
            "p",
            None,
            TaskStatus::Pending,
            build_resource_list("2", "4Gi"),
            &[],
            &[],
        )],
    );
    high.priority = 100;

    let snapshot = build_snapshot(
        vec![
            build_node("n1", build_resource_list("2", "4Gi"), &[]),
            build_node("n2", build_resource_list("2", "4Gi"), &[]),
        ],
        vec![low, high],
        vec![build_queue("q1", 1, None, None)],
    );

    let (scheduler, binder) = engine(snapshot, SchedulerConf::default());
    let result = scheduler.run_once().expect("cycle runs");

    let evictions = binder.evictions();
    assert_eq!(evictions.len(), 1);
    assert_eq!(evictions[0].0, "ns1/v1");
    assert!(evictions[0].1.contains("ns1/p"));
    assert_eq!(result.pipelined.get("ns1/p").map(String::as_str), Some("n1"));
}

#[test]
fn gang_invalid_job_rolls_back_partial_allocation() {
    let snapshot = build_snapshot(
        vec![build_node("n1", build_resource_list("1", "2Gi"), &[])],
        vec![build_job(
            "gang",
            "ns1",
            "q1",
            2,
            no_resources(),
            false,
            vec![
                build_task(
                    "ns1",
                    "t1",
                    None,
                    TaskStatus::Pending,
                    build_resource_list("1", "1Gi"),
                    &[],
                    &[],
                ),
                build_task(
                    "ns1",
                    "t2",
                    None,
                    TaskStatus::Pending,
                    build_resource_list("1", "1Gi"),
                    &[],
                    &[],
                ),
            ],
        )],
        vec![build_queue("q1", 1, None, None)],
    );

    let (scheduler, binder) = engine(snapshot, SchedulerConf::default());
    let result = scheduler.run_once().expect("cycle runs");

    // Only one member fits, so the whole gang stays pending.
    assert!(binder.binds().is_empty());
    assert!(result.bindings.is_empty());
    assert!(result.pipelined.is_empty());
}

#[test]
fn identical_snapshots_produce_identical_commits() {
    let make = || {
        build_snapshot(
            vec![
                build_node("n1", build_resource_list("2", "4Gi"), &[]),
                build_node("n2", build_resource_list("2", "4Gi"), &[]),
            ],
            vec![build_job(
                "pg1",
                "ns1",
                "q1",
                1,
                no_resources(),
                false,
                vec![
                    build_task(
                        "ns1",
                        "a",
                        None,
                        TaskStatus::Pending,
                        build_resource_list("1", "1Gi"),
                        &[],
                        &[],
                    ),
                    build_task(
                        "ns1",
                        "b",
                        None,
                        TaskStatus::Pending,
                        build_resource_list("1", "1Gi"),
                        &[],
                        &[],
                    ),
                ],
            )],
            vec![build_queue("q1", 1, None, None)],
        )
    };

    let (s1, _) = engine(make(), SchedulerConf::default());
    let (s2, _) = engine(make(), SchedulerConf::default());
    let r1 = s1.run_once().expect("cycle runs");
    let r2 = s2.run_once().expect("cycle runs");
    assert_eq!(r1, r2);
    assert_eq!(r1.bindings.len(), 2);
}

#[test]
fn unknown_plugin_fails_the_cycle() {
    let snapshot = build_snapshot(
        vec![build_node("n1", build_resource_list("1", "1Gi"), &[])],
        vec![],
        vec![build_queue("q1", 1, None, None)],
    );
    let conf = SchedulerConf {
        tiers: vec![Tier {
            plugins: vec![PluginOption::new("mystery")],
        }],
        ..SchedulerConf::default()
    };

    let (scheduler, binder) = engine(snapshot, conf);
    assert!(scheduler.run_once().is_err());
    assert!(binder.binds().is_empty());
}

#[test]
fn expired_deadline_halts_the_pipeline_cleanly() {
    let snapshot = build_snapshot(
        vec![build_node("n1", build_resource_list("2", "4Gi"), &[])],
        vec![build_job(
            "pg1",
            "ns1",
            "q1",
            1,
            no_resources(),
            false,
            vec![build_task(
                "ns1",
                "p1",
                None,
                TaskStatus::Pending,
                Resource::new().with(RES_CPU, 1000.0),
                &[],
                &[],
            )],
        )],
        vec![build_queue("q1", 1, None, None)],
    );

    let (scheduler, binder) = engine(snapshot, SchedulerConf::default());
    let scheduler = scheduler.with_session_timeout(Duration::ZERO);
    let result = scheduler.run_once().expect("cycle still closes");

    assert!(result.bindings.is_empty());
    assert!(binder.binds().is_empty());
}

#[test]
fn enqueued_job_reports_phase_change() {
    let snapshot = build_snapshot(
        vec![build_node("n1", build_resource_list("2", "4Gi"), &[])],
        vec![build_job(
            "pg1",
            "ns1",
            "q1",
            1,
            build_resource_list("1", "1Gi"),
            true,
            vec![build_task(
                "ns1",
                "p1",
                None,
                TaskStatus::Pending,
                build_resource_list("1", "1Gi"),
                &[],
                &[],
            )],
        )],
        vec![build_queue(
            "q1",
            1,
            None,
            Some(build_resource_list("2", "2Gi")),
        )],
    );

    let (scheduler, binder) = engine(snapshot, SchedulerConf::default());
    scheduler.run_once().expect("cycle runs");

    // Admitted, allocated, and gang-complete in one session.
    assert_eq!(
        binder.binds().get("ns1/p1").map(String::as_str),
        Some("n1")
    );
    assert_eq!(
        binder.status_updates().get("ns1/pg1"),
        Some(&JobPhase::Running)
    );
}
