// src/pool/worker.rs

//! The loop run by each fixed pool thread, and the task-running helpers it
//! shares with off-pool threads.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::dag::Claim;
use crate::errors::PoolError;
use crate::pool::off_pool;
use crate::pool::shared::{LiveThread, Shared};
use crate::task::TaskHandle;

/// Body of a worker thread.
///
/// Claims ready tasks until the run drains or a failure is recorded. Only
/// the claim happens under the lock; task bodies run outside it.
pub(crate) fn run_worker(live: LiveThread) {
    let shared = &live.shared;

    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                match state.graph.claim() {
                    Claim::Run(task) => break task,
                    Claim::Wait => shared.changed.wait(&mut state),
                    claim @ (Claim::Drained | Claim::Aborted) => {
                        trace!(?claim, "worker exiting");
                        // Let the other waiting workers observe the same state.
                        shared.changed.notify_all();
                        return;
                    }
                }
            }
        };

        debug!(task = %task.label(), "worker claimed task");
        let outcome = run_guarded(&task);
        report_completion(shared, &task, outcome);
    }
}

/// Run a task, turning both `Err` returns and panics into a [`PoolError`].
pub(crate) fn run_guarded(task: &TaskHandle) -> Result<(), PoolError> {
    match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(PoolError::TaskFailed(err)),
        Err(payload) => Err(PoolError::TaskPanicked {
            task: task.id(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// Feed a finished task's outcome back into the graph, launch any off-pool
/// dependents it released and wake the workers.
pub(crate) fn report_completion(
    shared: &Arc<Shared>,
    task: &TaskHandle,
    outcome: Result<(), PoolError>,
) {
    debug!(task = %task.label(), ok = outcome.is_ok(), "task finished");

    let mut state = shared.state.lock();
    let launches = state.graph.complete(task.id(), outcome);
    off_pool::launch(shared, &mut state, launches);
    drop(state);

    shared.changed.notify_all();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
