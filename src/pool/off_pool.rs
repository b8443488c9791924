// src/pool/off_pool.rs

//! Dedicated threads for off-pool tasks.
//!
//! An off-pool task never occupies one of the fixed worker slots: it gets a
//! thread of its own, then reports its outcome through the same completion
//! path as a worker.

use std::mem;
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::errors::PoolError;
use crate::pool::shared::{LiveThread, PoolState, RunPhase, Shared};
use crate::pool::worker::{report_completion, run_guarded};
use crate::task::TaskHandle;

/// Launch off-pool tasks that the graph has already moved to `executing`.
///
/// Called with the pool lock held. Before `execute()` the tasks are parked
/// in `deferred`; after a failure they are abandoned without running.
pub(crate) fn launch(shared: &Arc<Shared>, state: &mut PoolState, tasks: Vec<TaskHandle>) {
    if tasks.is_empty() {
        return;
    }

    if state.phase == RunPhase::NotStarted {
        debug!(count = tasks.len(), "deferring off-pool tasks until execute()");
        state.deferred.extend(tasks);
        return;
    }

    for task in tasks {
        if state.graph.has_failed() {
            debug!(task = %task.label(), "run already failed; abandoning off-pool task");
            state.graph.abandon(task.id());
            continue;
        }

        let name = format!(
            "{}-offpool-{}",
            shared.config.thread_name_prefix,
            task.id().get()
        );
        let live = shared.register_thread();
        let thread_task = task.clone();

        debug!(task = %task.label(), thread = %name, "launching off-pool thread");
        let spawned = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_off_pool(live, thread_task));

        match spawned {
            Ok(handle) => state.off_pool_threads.push(handle),
            Err(source) => {
                // The task never ran; count it as failed so the run stops.
                let released = state
                    .graph
                    .complete(task.id(), Err(PoolError::Spawn { thread: name, source }));
                debug_assert!(released.is_empty());
            }
        }
    }
}

/// Launch everything that was submitted off-pool before `execute()`.
pub(crate) fn launch_deferred(shared: &Arc<Shared>, state: &mut PoolState) {
    let deferred = mem::take(&mut state.deferred);
    launch(shared, state, deferred);
}

fn run_off_pool(live: LiveThread, task: TaskHandle) {
    let outcome = run_guarded(&task);
    report_completion(&live.shared, &task, outcome);
}
