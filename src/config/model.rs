// src/config/model.rs

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::config::pool::PoolConfig;

/// Job file as read from TOML, before validation.
///
/// ```toml
/// [pool]
/// threads = 4
/// thread_name_prefix = "build"
///
/// [task.fetch]
/// cmd = "curl -sO https://example.com/data.csv"
/// off_pool = true
///
/// [task.compile]
/// cmd = "make"
/// after = ["fetch"]
/// ```
///
/// Convert into a [`ConfigFile`] with `ConfigFile::try_from`, which checks
/// dependencies and acyclicity.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub pool: PoolSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[pool]` section. Every field is optional; unset fields fall back to
/// [`PoolConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolSection {
    /// Number of fixed worker threads (>= 1).
    #[serde(default)]
    pub threads: Option<usize>,

    #[serde(default)]
    pub thread_name_prefix: Option<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to run.
    pub cmd: String,

    /// This task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Run on a dedicated thread rather than a pool worker. Meant for
    /// commands that mostly wait (downloads, remote calls).
    #[serde(default)]
    pub off_pool: bool,
}

/// A validated job file.
///
/// Guarantees that every `after` entry names an existing task, that no task
/// depends on itself and that the dependency graph is acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pool: PoolSection,
    pub task: BTreeMap<String, TaskConfig>,
    /// Task names, dependencies before dependents.
    order: Vec<String>,
}

impl ConfigFile {
    /// Used by validation once the raw file has been checked.
    pub(crate) fn new_unchecked(
        pool: PoolSection,
        task: BTreeMap<String, TaskConfig>,
        order: Vec<String>,
    ) -> Self {
        Self { pool, task, order }
    }

    /// Task names in an order where every task comes after all of its
    /// dependencies.
    pub fn topological_order(&self) -> &[String] {
        &self.order
    }

    /// Pool settings from `[pool]`, defaults for anything unset.
    pub fn pool_config(&self) -> PoolConfig {
        let mut config = PoolConfig::default();
        if let Some(threads) = self.pool.threads.and_then(NonZeroUsize::new) {
            config = config.with_thread_count(threads);
        }
        if let Some(prefix) = &self.pool.thread_name_prefix {
            config = config.with_thread_name_prefix(prefix.as_str());
        }
        config
    }
}
