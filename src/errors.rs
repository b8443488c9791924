// src/errors.rs

//! Crate-wide error types.
//!
//! - [`PoolError`] is what the scheduler itself reports: task failures,
//!   thread failures and usage errors.
//! - [`TaskpoolError`] is the application-level error used by the job-file
//!   loader and the CLI.

use thiserror::Error;

use crate::types::TaskId;

/// Errors reported by [`ThreadPool`](crate::pool::ThreadPool).
///
/// Only the *first* task failure of a run is ever surfaced; failures that
/// happen after it are logged at `debug` and dropped.
#[derive(Error, Debug)]
pub enum PoolError {
    /// A task returned an error. The task's own error is kept as-is so its
    /// cause chain survives; see [`PoolError::downcast_task_error`].
    #[error(transparent)]
    TaskFailed(anyhow::Error),

    #[error("task {task} panicked: {message}")]
    TaskPanicked { task: TaskId, message: String },

    #[error("pool thread '{thread}' panicked outside of a task")]
    WorkerPanicked { thread: String },

    #[error("failed to spawn thread '{thread}': {source}")]
    Spawn {
        thread: String,
        #[source]
        source: std::io::Error,
    },

    #[error("task {task} depends on {dependency}, which was never submitted to this pool")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    #[error("task {0} was already submitted to a pool")]
    DuplicateTask(TaskId),

    #[error("{blocked} task(s) still blocked on dependencies that were never submitted")]
    Stalled { blocked: usize },

    #[error("execute() was already called on this pool")]
    AlreadyExecuted,
}

impl PoolError {
    /// The error returned by the failing task, if this is a task failure.
    pub fn task_error(&self) -> Option<&anyhow::Error> {
        match self {
            PoolError::TaskFailed(err) => Some(err),
            _ => None,
        }
    }

    /// Recover a task's typed error.
    ///
    /// Looks through the whole cause chain, so it works whether the task
    /// returned `E` directly or wrapped it with `anyhow::Context`.
    pub fn downcast_task_error<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let err = self.task_error()?;
        err.chain().find_map(|cause| cause.downcast_ref::<E>())
    }

    /// Whether this error was caused by a task body (error or panic) rather
    /// than by pool misuse or thread failures.
    pub fn is_task_failure(&self) -> bool {
        matches!(
            self,
            PoolError::TaskFailed(_) | PoolError::TaskPanicked { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum TaskpoolError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Run failed: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskpoolError>;
