// tests/dependencies.rs

mod common;
use crate::common::{ExecutionLog, init_tracing, noop, with_timeout};

use std::time::Duration;

use taskpool::{PoolError, TaskHandle, ThreadPool};

#[test]
fn multi_level_dependencies_run_in_order_for_every_thread_count() {
    init_tracing();

    with_timeout(|| {
        for thread_count in 1..10 {
            let log = ExecutionLog::new();
            let pool = ThreadPool::builder()
                .thread_count(thread_count)
                .thread_name_prefix(format!("levels{thread_count}"))
                .build();

            let write_a = vec![
                log.sleeping_task("a", Duration::from_millis(20)),
                log.sleeping_task("a", Duration::from_millis(20)),
            ];
            let write_b = vec![
                log.sleeping_task("b", Duration::from_millis(20)),
                log.sleeping_task("b", Duration::from_millis(20)),
            ];

            // One dependency that has already finished by the time the
            // dependents are added must not hold them back.
            let finished = noop();
            let mut a_and_finished = write_a.clone();
            a_and_finished.push(finished.clone());

            pool.add_task(finished).unwrap();
            pool.add_tasks(write_a.clone()).unwrap();
            pool.add_task_with_dependencies(&a_and_finished, write_b.clone())
                .unwrap();
            pool.add_task_with_dependencies(&write_b, [log.task("c")])
                .unwrap();

            pool.execute().unwrap();

            assert_eq!(log.output(), "aabbc", "thread_count = {thread_count}");
            assert!(!log.overlap_detected());
        }
    });
}

#[test]
fn fan_in_runs_only_after_all_dependencies() {
    init_tracing();

    with_timeout(|| {
        let log = ExecutionLog::new();
        let pool = ThreadPool::builder().thread_count(4).build();

        let deps = vec![
            log.sleeping_task("A", Duration::from_millis(30)),
            log.sleeping_task("B", Duration::from_millis(10)),
            log.sleeping_task("C", Duration::from_millis(20)),
        ];
        pool.add_tasks(deps.clone()).unwrap();
        pool.add_task_with_dependencies(&deps, [log.task("join")])
            .unwrap();

        pool.execute().unwrap();

        for dep in ["A", "B", "C"] {
            assert!(
                log.finished_before_started(dep, "join"),
                "{dep} must finish before join starts: {:?}",
                log.events()
            );
        }
        assert_eq!(log.start_count("join"), 1);
    });
}

#[test]
fn dependency_on_finished_task_from_inside_a_task() {
    init_tracing();

    with_timeout(|| {
        let log = ExecutionLog::new();
        let pool = ThreadPool::builder().thread_count(2).build();

        let first = log.task("first");
        pool.add_task(first.clone()).unwrap();

        let spawner = {
            let pool = pool.clone();
            let log = log.clone();
            TaskHandle::from_fn(move || {
                // `first` may or may not have finished; either way `second`
                // must run exactly once, after it.
                pool.add_task_with_dependencies(&[first.clone()], [log.task("second")])?;
                Ok(())
            })
        };
        pool.add_task(spawner).unwrap();

        pool.execute().unwrap();

        assert!(log.finished_before_started("first", "second"));
        assert_eq!(log.start_count("second"), 1);
    });
}

#[test]
fn dependency_on_never_submitted_task_is_rejected() {
    init_tracing();

    let pool = ThreadPool::builder().thread_count(1).build();
    let ghost = noop();
    let task = noop();

    let err = pool
        .add_task_with_dependencies(&[ghost.clone()], [task.clone()])
        .unwrap_err();

    match err {
        PoolError::UnknownDependency { task: t, dependency } => {
            assert_eq!(t, task.id());
            assert_eq!(dependency, ghost.id());
        }
        other => panic!("expected UnknownDependency, got {:?}", other),
    }

    // The rejected task was not registered, so it can still be added.
    pool.add_task(task).unwrap();
    pool.execute().unwrap();
}

#[test]
fn submitting_the_same_handle_twice_is_rejected() {
    init_tracing();

    let log = ExecutionLog::new();
    let pool = ThreadPool::builder().thread_count(2).build();
    let task = log.task("once");

    pool.add_task(task.clone()).unwrap();
    let err = pool.add_task(task).unwrap_err();
    assert!(matches!(err, PoolError::DuplicateTask(_)));

    pool.execute().unwrap();
    assert_eq!(log.start_count("once"), 1);
}

#[test]
fn behaviourally_identical_tasks_are_distinct_nodes() {
    init_tracing();

    with_timeout(|| {
        let log = ExecutionLog::new();
        let pool = ThreadPool::builder().thread_count(3).build();

        let twins = vec![log.task("twin"), log.task("twin")];
        assert_ne!(twins[0].id(), twins[1].id());

        pool.add_tasks(twins.clone()).unwrap();
        pool.add_task_with_dependencies(&twins, [log.task("after")])
            .unwrap();
        pool.execute().unwrap();

        assert_eq!(log.start_count("twin"), 2);
        assert!(log.finished_before_started("twin", "after"));
    });
}

#[test]
fn label_is_shared_by_every_clone_of_a_handle() {
    let task = noop();
    let submitted = task.clone();
    assert_eq!(submitted.label(), task.id().to_string());

    let task = task.with_label("fetch-index");

    assert_eq!(submitted.label(), "fetch-index");
    assert_eq!(task, submitted);
}
