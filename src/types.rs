use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a submitted task.
///
/// Tasks are tracked by this id, never by value: two behaviourally identical
/// closures wrapped in two handles are two distinct graph nodes, while two
/// clones of the same handle are one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(NonZeroU64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl TaskId {
    /// Allocate a fresh id.
    ///
    /// Ids are allocated when a handle is created rather than when it is
    /// submitted, so that dependents can refer to a task before it is added.
    pub(crate) fn next() -> Self {
        let raw = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would need 2^64 allocations to wrap.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Where a task runs once its dependencies are satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Claimed by one of the fixed pool workers.
    #[default]
    InPool,
    /// Runs on a dedicated thread of its own, outside the worker count.
    OffPool,
}
