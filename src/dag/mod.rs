// src/dag/mod.rs

//! Dependency bookkeeping for the thread pool.
//!
//! Everything here is pure and single-threaded: no locks, no threads. The
//! [`pool`](crate::pool) module wraps a [`DependencyGraph`] in a mutex and
//! drives it from worker and off-pool threads.
//!
//! - [`identity`] holds the identity-keyed containers.
//! - [`graph`] contains the state machine deciding what is ready and what a
//!   completion unblocks.
//! - [`task_record`] provides per-task records and the public state view.
//! - [`claim`] defines the result of a worker's claim attempt.

pub mod claim;
pub mod graph;
pub mod identity;
pub mod task_record;

pub use claim::Claim;
pub use graph::DependencyGraph;
pub use identity::{IdentityMap, IdentitySet};
pub use task_record::{TaskRecord, TaskState};
