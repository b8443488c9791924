// src/pool/mod.rs

//! The thread pool: a fixed set of workers plus on-demand off-pool threads,
//! all driving one [`DependencyGraph`](crate::dag::DependencyGraph).
//!
//! - [`shared`] holds the lock-protected state and the wake-up condvar.
//! - [`worker`] is the loop each fixed worker runs.
//! - [`off_pool`] launches dedicated threads for off-pool tasks.
//!
//! Usage:
//!
//! ```no_run
//! use taskpool::{TaskHandle, ThreadPool};
//!
//! let pool = ThreadPool::builder().thread_count(4).build();
//!
//! let fetch = TaskHandle::from_fn(|| Ok(()));
//! let parse = TaskHandle::from_fn(|| Ok(()));
//! pool.add_task_off_pool([fetch.clone()])?;
//! pool.add_task_with_dependencies(&[fetch], [parse])?;
//!
//! pool.execute()?;
//! # Ok::<(), taskpool::PoolError>(())
//! ```

pub mod off_pool;
pub(crate) mod shared;
pub mod worker;

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::config::PoolConfig;
use crate::errors::PoolError;
use crate::task::TaskHandle;
use crate::types::ExecutionMode;

use self::shared::{RunPhase, Shared};

/// Runs tasks on a fixed number of threads, honouring dependencies between
/// them.
///
/// Unlike a plain executor, tasks may add further tasks while they run, so
/// the pool handle is cheap to clone and meant to be captured by task
/// closures. All clones refer to the same pool.
///
/// No thread exists until [`execute`](Self::execute) is called, and every
/// thread it starts has been joined by the time it returns.
///
/// If any task fails, the first failure is returned by `execute()` once all
/// threads have wound down. Tasks already running are allowed to finish;
/// nothing new starts. Later failures are dropped.
#[derive(Clone)]
pub struct ThreadPool {
    shared: Arc<Shared>,
}

impl ThreadPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
        }
    }

    pub fn builder() -> ThreadPoolBuilder {
        ThreadPoolBuilder::default()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Add a task with no dependencies.
    pub fn add_task(&self, task: TaskHandle) -> Result<(), PoolError> {
        self.submit(&[], vec![task], ExecutionMode::InPool)
    }

    /// Add several tasks with no dependencies.
    pub fn add_tasks(&self, tasks: impl IntoIterator<Item = TaskHandle>) -> Result<(), PoolError> {
        self.submit(&[], tasks.into_iter().collect(), ExecutionMode::InPool)
    }

    /// Add tasks that may only start once every task in `dependencies` has
    /// finished.
    ///
    /// Dependencies must have been added to this pool already (they may have
    /// finished since), unless they were created with
    /// [`TaskHandle::any_order`] or [`TaskHandle::sync_point`].
    pub fn add_task_with_dependencies(
        &self,
        dependencies: &[TaskHandle],
        tasks: impl IntoIterator<Item = TaskHandle>,
    ) -> Result<(), PoolError> {
        self.submit(dependencies, tasks.into_iter().collect(), ExecutionMode::InPool)
    }

    /// Add tasks that each run on a dedicated thread instead of a worker.
    ///
    /// Intended for work that blocks without using CPU (an HTTP request, say)
    /// in a pool sized for CPU-bound work.
    pub fn add_task_off_pool(
        &self,
        tasks: impl IntoIterator<Item = TaskHandle>,
    ) -> Result<(), PoolError> {
        self.submit(&[], tasks.into_iter().collect(), ExecutionMode::OffPool)
    }

    /// Off-pool variant of [`add_task_with_dependencies`](Self::add_task_with_dependencies).
    pub fn add_task_with_dependencies_off_pool(
        &self,
        dependencies: &[TaskHandle],
        tasks: impl IntoIterator<Item = TaskHandle>,
    ) -> Result<(), PoolError> {
        self.submit(dependencies, tasks.into_iter().collect(), ExecutionMode::OffPool)
    }

    /// Start the workers, run every task (including tasks added while
    /// running) and wait for all threads to finish.
    ///
    /// # Errors
    /// - the first task failure (error or panic), if any;
    /// - [`PoolError::Stalled`] if tasks remained blocked on any-order
    ///   dependencies that were never submitted;
    /// - [`PoolError::AlreadyExecuted`] on a second call.
    pub fn execute(&self) -> Result<(), PoolError> {
        let shared = &self.shared;
        let thread_count = shared.config.thread_count.get();
        let prefix = &shared.config.thread_name_prefix;

        {
            let mut state = shared.state.lock();
            if state.phase != RunPhase::NotStarted {
                return Err(PoolError::AlreadyExecuted);
            }
            state.phase = RunPhase::Running;
            off_pool::launch_deferred(shared, &mut state);
        }

        info!(threads = thread_count, prefix = %prefix, "thread pool starting");

        let mut workers: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(thread_count);
        for i in 0..thread_count {
            let name = format!("{prefix}-thread{i}");
            let live = shared.register_thread();
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker::run_worker(live));

            match spawned {
                Ok(handle) => workers.push((name, handle)),
                Err(source) => {
                    shared
                        .state
                        .lock()
                        .graph
                        .record_failure(PoolError::Spawn { thread: name, source });
                    shared.changed.notify_all();
                    break;
                }
            }
        }

        self.join_workers(workers);
        self.join_off_pool_threads();

        let (outcome, unrun, deferred) = {
            let mut state = shared.state.lock();
            state.phase = RunPhase::Finished;

            let blocked = state.graph.blocked_len();
            let outcome = match state.graph.take_first_error() {
                Some(err) => Err(err),
                None if blocked > 0 => Err(PoolError::Stalled { blocked }),
                None => Ok(()),
            };

            // Tasks that never ran may capture this pool; keeping them would
            // keep the pool alive through its own state.
            let unrun = state.graph.clear_unfinished();
            let deferred = std::mem::take(&mut state.deferred);
            (outcome, unrun, deferred)
        };
        // Dropped outside the lock: a captured value's `Drop` may use the pool.
        drop(unrun);
        drop(deferred);

        match &outcome {
            Ok(()) => info!("thread pool finished"),
            Err(err) => info!(error = %err, "thread pool finished with failure"),
        }
        outcome
    }

    /// Number of pool-owned threads (workers and off-pool) currently alive.
    /// Always zero once `execute()` has returned.
    pub fn active_threads(&self) -> usize {
        self.shared.live_threads()
    }

    fn submit(
        &self,
        dependencies: &[TaskHandle],
        tasks: Vec<TaskHandle>,
        mode: ExecutionMode,
    ) -> Result<(), PoolError> {
        let mut state = self.shared.state.lock();
        if state.phase == RunPhase::Finished {
            return Err(PoolError::AlreadyExecuted);
        }

        let launches = state.graph.submit(dependencies, tasks, mode)?;
        off_pool::launch(&self.shared, &mut state, launches);
        drop(state);

        self.shared.changed.notify_all();
        Ok(())
    }

    fn join_workers(&self, workers: Vec<(String, JoinHandle<()>)>) {
        for (name, handle) in workers {
            if handle.join().is_err() {
                self.shared
                    .state
                    .lock()
                    .graph
                    .record_failure(PoolError::WorkerPanicked { thread: name });
                self.shared.changed.notify_all();
            }
        }
    }

    /// Join off-pool threads until none are left. After a failure the
    /// workers exit while off-pool tasks may still be running.
    fn join_off_pool_threads(&self) {
        loop {
            let handles = std::mem::take(&mut self.shared.state.lock().off_pool_threads);
            if handles.is_empty() {
                return;
            }

            debug!(count = handles.len(), "joining off-pool threads");
            for handle in handles {
                let name = handle.thread().name().unwrap_or("off-pool").to_string();
                if handle.join().is_err() {
                    self.shared
                        .state
                        .lock()
                        .graph
                        .record_failure(PoolError::WorkerPanicked { thread: name });
                }
            }
        }
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.shared.config)
            .field("active_threads", &self.active_threads())
            .finish()
    }
}

/// Builder for [`ThreadPool`].
#[derive(Debug, Clone, Default)]
pub struct ThreadPoolBuilder {
    config: PoolConfig,
}

impl ThreadPoolBuilder {
    /// Number of fixed worker threads. Zero is treated as one.
    pub fn thread_count(mut self, count: usize) -> Self {
        self.config.thread_count = NonZeroUsize::new(count).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Prefix for thread names, for debugger and log output.
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn build(self) -> ThreadPool {
        ThreadPool::new(self.config)
    }
}
