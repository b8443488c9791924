// src/config/pool.rs

use std::num::NonZeroUsize;

/// Default thread-name prefix; threads are named `<prefix>-thread<i>` and
/// `<prefix>-offpool-<id>`.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "taskpool";

/// Settings for a [`ThreadPool`](crate::pool::ThreadPool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of fixed worker threads. Off-pool threads are not counted.
    pub thread_count: NonZeroUsize,
    /// Prefix for thread names. Diagnostics only.
    pub thread_name_prefix: String,
}

impl PoolConfig {
    pub fn with_thread_count(mut self, thread_count: NonZeroUsize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            thread_count: default_thread_count(),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

/// Host parallelism, or 1 if it cannot be determined.
pub fn default_thread_count() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
