// src/dag/claim.rs

//! Result type for a worker's attempt to claim work.

use crate::task::TaskHandle;

/// What a worker should do after asking the graph for work.
#[derive(Debug, Clone)]
pub enum Claim {
    /// Run this task; it has already been moved to `executing`.
    Run(TaskHandle),
    /// Nothing is ready but work is still in flight; wait for a change.
    Wait,
    /// Nothing is ready or executing: the run has drained.
    Drained,
    /// A failure has been recorded; claim nothing more.
    Aborted,
}
