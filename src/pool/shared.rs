// src/pool/shared.rs

//! State shared between the pool handle, its workers and off-pool threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::config::PoolConfig;
use crate::dag::DependencyGraph;
use crate::task::TaskHandle;

/// Lifecycle of a pool with respect to its single `execute()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunPhase {
    /// `execute()` not called yet; no threads exist.
    NotStarted,
    Running,
    /// `execute()` returned; the pool accepts no more work.
    Finished,
}

/// Everything guarded by the pool's single lock.
#[derive(Debug)]
pub(crate) struct PoolState {
    pub(crate) graph: DependencyGraph,
    pub(crate) phase: RunPhase,
    /// Off-pool tasks (already marked executing) waiting for `execute()`.
    pub(crate) deferred: Vec<TaskHandle>,
    /// Off-pool threads to join before `execute()` returns.
    pub(crate) off_pool_threads: Vec<JoinHandle<()>>,
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: PoolConfig,
    pub(crate) state: Mutex<PoolState>,
    /// Notified on every submission, completion and recorded failure.
    pub(crate) changed: Condvar,
    live_threads: AtomicUsize,
}

impl Shared {
    pub(crate) fn new(config: PoolConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PoolState {
                graph: DependencyGraph::new(),
                phase: RunPhase::NotStarted,
                deferred: Vec::new(),
                off_pool_threads: Vec::new(),
            }),
            changed: Condvar::new(),
            live_threads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn live_threads(&self) -> usize {
        self.live_threads.load(Ordering::SeqCst)
    }

    /// Count a thread about to be spawned.
    ///
    /// The returned guard moves into the thread's closure. It uncounts the
    /// thread when dropped: at thread exit, or together with the closure if
    /// the spawn fails.
    pub(crate) fn register_thread(self: &Arc<Self>) -> LiveThread {
        self.live_threads.fetch_add(1, Ordering::SeqCst);
        LiveThread {
            shared: Arc::clone(self),
        }
    }
}

/// A counted pool thread's handle on the shared state.
pub(crate) struct LiveThread {
    pub(crate) shared: Arc<Shared>,
}

impl Drop for LiveThread {
    fn drop(&mut self) {
        self.shared.live_threads.fetch_sub(1, Ordering::SeqCst);
    }
}
