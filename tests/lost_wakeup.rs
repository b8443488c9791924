// tests/lost_wakeup.rs
//
// Registering a dependent while its dependency is completing on another
// thread must neither lose the dependent nor run it twice.

mod common;
use crate::common::{init_tracing, noop, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use taskpool::{TaskHandle, ThreadPool};

fn counting(counter: &Arc<AtomicUsize>) -> TaskHandle {
    let counter = Arc::clone(counter);
    TaskHandle::from_fn(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[test]
fn dependent_registered_during_completion_runs_exactly_once() {
    init_tracing();

    with_timeout(|| {
        for round in 0..200 {
            let runs = Arc::new(AtomicUsize::new(0));
            let pool = ThreadPool::builder().thread_count(2).build();

            let dependency = noop();
            pool.add_task(dependency.clone()).unwrap();

            let registrar = {
                let pool = pool.clone();
                let runs = Arc::clone(&runs);
                TaskHandle::from_fn(move || {
                    pool.add_task_with_dependencies(&[dependency.clone()], [counting(&runs)])?;
                    Ok(())
                })
            };
            pool.add_task(registrar).unwrap();

            pool.execute().unwrap();
            assert_eq!(runs.load(Ordering::SeqCst), 1, "round {round}");
        }
    });
}

#[test]
fn many_dependents_racing_a_shared_dependency() {
    init_tracing();

    with_timeout(|| {
        for round in 0..50 {
            let runs = Arc::new(AtomicUsize::new(0));
            let pool = ThreadPool::builder().thread_count(4).build();

            let shared = noop();
            pool.add_task(shared.clone()).unwrap();

            for _ in 0..16 {
                let pool_in_task = pool.clone();
                let runs = Arc::clone(&runs);
                let shared = shared.clone();
                pool.add_task(TaskHandle::from_fn(move || {
                    pool_in_task.add_task_with_dependencies(&[shared.clone()], [counting(&runs)])?;
                    Ok(())
                }))
                .unwrap();
            }

            pool.execute().unwrap();
            assert_eq!(runs.load(Ordering::SeqCst), 16, "round {round}");
        }
    });
}
