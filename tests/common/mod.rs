#![allow(dead_code)]

pub use taskpool_test_utils::builders;
pub use taskpool_test_utils::recorder::{Event, ExecutionLog};
pub use taskpool_test_utils::{init_tracing, with_timeout};

use taskpool::TaskHandle;

/// A task that does nothing and succeeds.
pub fn noop() -> TaskHandle {
    TaskHandle::from_fn(|| Ok(()))
}
