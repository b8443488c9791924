use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use proptest::prelude::*;
use taskpool::dag::{Claim, DependencyGraph};
use taskpool::{ExecutionMode, TaskHandle, ThreadPool};
use taskpool_test_utils::{init_tracing, with_timeout};

/// Random DAG shape: task `i` depends on a subset of `0..i`, plus whether
/// it runs off-pool.
#[derive(Debug, Clone)]
struct DagShape {
    deps: Vec<BTreeSet<usize>>,
    off_pool: Vec<bool>,
}

// Acyclic by construction: only edges from lower to higher indices.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = DagShape> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..4),
            num_tasks,
        );
        let off_pool_strat = proptest::collection::vec(proptest::bool::weighted(0.2), num_tasks);

        (deps_strat, off_pool_strat).prop_map(|(raw_deps, off_pool)| {
            let deps = raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    if i == 0 {
                        BTreeSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    }
                })
                .collect();
            DagShape { deps, off_pool }
        })
    })
}

/// Start and end ticks of one task run, from a shared logical clock.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
}

fn recording_task(
    index: usize,
    clock: &Arc<AtomicUsize>,
    spans: &Arc<Mutex<Vec<Vec<Span>>>>,
) -> TaskHandle {
    let clock = Arc::clone(clock);
    let spans = Arc::clone(spans);
    TaskHandle::from_fn(move || {
        let start = clock.fetch_add(1, Ordering::SeqCst);
        std::thread::yield_now();
        let end = clock.fetch_add(1, Ordering::SeqCst);
        spans.lock()[index].push(Span { start, end });
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every task runs exactly once, and only after all of its
    /// dependencies have finished.
    #[test]
    fn pool_respects_every_dependency(
        shape in dag_strategy(24),
        thread_count in 1..6usize,
    ) {
        init_tracing();

        let task_count = shape.deps.len();
        let (spans, shape) = with_timeout(move || {
            let clock = Arc::new(AtomicUsize::new(0));
            let spans = Arc::new(Mutex::new(vec![Vec::new(); task_count]));
            let pool = ThreadPool::builder().thread_count(thread_count).build();

            let mut handles: Vec<TaskHandle> = Vec::with_capacity(task_count);
            for i in 0..task_count {
                let task = recording_task(i, &clock, &spans);
                let deps: Vec<TaskHandle> =
                    shape.deps[i].iter().map(|&d| handles[d].clone()).collect();
                if shape.off_pool[i] {
                    pool.add_task_with_dependencies_off_pool(&deps, [task.clone()])
                        .expect("valid submission");
                } else {
                    pool.add_task_with_dependencies(&deps, [task.clone()])
                        .expect("valid submission");
                }
                handles.push(task);
            }

            pool.execute().expect("run succeeds");
            assert_eq!(pool.active_threads(), 0);

            let spans = spans.lock().clone();
            (spans, shape)
        });

        for (i, runs) in spans.iter().enumerate() {
            prop_assert_eq!(runs.len(), 1, "task {} ran {} times", i, runs.len());
        }
        for (i, deps) in shape.deps.iter().enumerate() {
            for &d in deps {
                prop_assert!(
                    spans[d][0].end < spans[i][0].start,
                    "task {} started before its dependency {} ended",
                    i,
                    d
                );
            }
        }
    }

    /// Driving the graph by hand with an arbitrary choice of which running
    /// task completes next always drains, and dependencies complete first.
    #[test]
    fn graph_drains_under_any_completion_order(
        shape in dag_strategy(16),
        picks in proptest::collection::vec(any::<usize>(), 64),
    ) {
        let mut graph = DependencyGraph::new();
        let handles: Vec<TaskHandle> =
            (0..shape.deps.len()).map(|_| TaskHandle::from_fn(|| Ok(()))).collect();

        let mut running: Vec<TaskHandle> = Vec::new();
        for (i, task) in handles.iter().enumerate() {
            let deps: Vec<TaskHandle> =
                shape.deps[i].iter().map(|&d| handles[d].clone()).collect();
            let mode = if shape.off_pool[i] {
                ExecutionMode::OffPool
            } else {
                ExecutionMode::InPool
            };
            let launches = graph.submit(&deps, vec![task.clone()], mode).unwrap();
            running.extend(launches);
        }

        let mut completed: Vec<TaskHandle> = Vec::new();
        let mut step = 0;
        loop {
            while let Claim::Run(task) = graph.claim() {
                running.push(task);
            }
            if running.is_empty() {
                prop_assert!(matches!(graph.claim(), Claim::Drained));
                break;
            }

            let pick = picks[step % picks.len()] % running.len();
            step += 1;
            let task = running.swap_remove(pick);

            for dep in &shape.deps[handles.iter().position(|h| h == &task).unwrap()] {
                prop_assert!(completed.contains(&handles[*dep]));
            }
            running.extend(graph.complete(task.id(), Ok(())));
            completed.push(task);
        }

        prop_assert_eq!(completed.len(), handles.len());
        prop_assert_eq!(graph.blocked_len(), 0);
    }
}
