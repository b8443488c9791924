// tests/dynamic_growth.rs

mod common;
use crate::common::{ExecutionLog, init_tracing, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use taskpool::{TaskHandle, ThreadPool};

/// 0 -> 11 -> 2222 -> 33333333: every level spawns two tasks of the next
/// level, and only the leaves record anything.
fn doubling_task(pool: ThreadPool, log: ExecutionLog, level: u32) -> TaskHandle {
    TaskHandle::from_fn(move || {
        if level == 3 {
            log.push(common::Event::Finished(level.to_string()));
            return Ok(());
        }
        pool.add_tasks([
            doubling_task(pool.clone(), log.clone(), level + 1),
            doubling_task(pool.clone(), log.clone(), level + 1),
        ])?;
        Ok(())
    })
}

#[test]
fn tasks_added_by_running_tasks_are_executed() {
    init_tracing();

    with_timeout(|| {
        let log = ExecutionLog::new();
        let pool = ThreadPool::builder().thread_count(10).build();

        pool.add_task(doubling_task(pool.clone(), log.clone(), 0))
            .unwrap();
        pool.execute().unwrap();

        assert_eq!(log.output(), "33333333");
    });
}

#[test]
fn execute_waits_for_transitively_spawned_work_on_a_single_thread() {
    init_tracing();

    with_timeout(|| {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = ThreadPool::builder().thread_count(1).build();

        fn countdown(pool: ThreadPool, counter: Arc<AtomicUsize>, remaining: usize) -> TaskHandle {
            TaskHandle::from_fn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                if remaining > 0 {
                    pool.add_task(countdown(pool.clone(), counter.clone(), remaining - 1))?;
                }
                Ok(())
            })
        }

        pool.add_task(countdown(pool.clone(), Arc::clone(&counter), 99))
            .unwrap();
        pool.execute().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 100);
    });
}

#[test]
fn running_task_adds_dependents_of_itself_and_of_new_work() {
    init_tracing();

    with_timeout(|| {
        let log = ExecutionLog::new();
        let pool = ThreadPool::builder().thread_count(3).build();

        // The crawler pattern: a page task discovers two more pages and a
        // summary that must wait for both of them.
        let crawl = {
            let pool = pool.clone();
            let log = log.clone();
            TaskHandle::from_fn(move || {
                let pages = vec![
                    log.sleeping_task("page1", Duration::from_millis(20)),
                    log.sleeping_task("page2", Duration::from_millis(5)),
                ];
                pool.add_tasks(pages.clone())?;
                pool.add_task_with_dependencies(&pages, [log.task("summary")])?;
                Ok(())
            })
        };
        pool.add_task(crawl).unwrap();
        pool.execute().unwrap();

        assert!(log.finished_before_started("page1", "summary"));
        assert!(log.finished_before_started("page2", "summary"));
        assert_eq!(log.start_count("summary"), 1);
    });
}
