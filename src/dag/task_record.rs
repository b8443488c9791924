// src/dag/task_record.rs

//! Per-task bookkeeping held by the dependency graph.

use crate::dag::identity::IdentitySet;
use crate::task::TaskHandle;
use crate::types::ExecutionMode;

/// One live (submitted, not yet finished) task.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub handle: TaskHandle,
    pub mode: ExecutionMode,
    /// Dependencies that have not finished yet. Empty once the task is ready
    /// or executing.
    pub pending: IdentitySet,
}

impl TaskRecord {
    pub fn new(handle: TaskHandle, mode: ExecutionMode, pending: IdentitySet) -> Self {
        Self {
            handle,
            mode,
            pending,
        }
    }
}

/// Public, read-only view of where a task is in its lifecycle.
///
/// Exposed for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Never submitted to this graph.
    Unknown,
    /// Waiting on at least one unfinished dependency.
    Blocked,
    /// Eligible to run, not yet claimed.
    Ready,
    /// Claimed by a worker or running on an off-pool thread.
    Executing,
    /// Ran to completion (successfully or not) and was forgotten.
    Finished,
}
