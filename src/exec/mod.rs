// src/exec/mod.rs

//! Running job-file commands on the pool.
//!
//! - [`command`] wraps a shell command as a [`Task`](crate::Task).
//! - [`plan`] adds a validated job file's tasks to a pool with their
//!   dependencies.

pub mod command;
pub mod plan;

pub use command::{CommandFailed, CommandTask};
pub use plan::schedule_config;
