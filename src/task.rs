// src/task.rs

//! Units of work and the handles the pool tracks them by.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::types::TaskId;

/// A unit of work: a no-argument, possibly failing operation.
///
/// Closures `Fn() -> anyhow::Result<()>` implement this trait, so most
/// callers never implement it by hand.
pub trait Task: Send + Sync + 'static {
    fn run(&self) -> anyhow::Result<()>;

    /// Human-readable name used in log output only.
    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }
}

impl<F> Task for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn run(&self) -> anyhow::Result<()> {
        self()
    }
}

/// Does nothing; used by [`TaskHandle::sync_point`].
struct Noop;

impl Task for Noop {
    fn run(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed("sync-point")
    }
}

struct TaskInner {
    id: TaskId,
    any_order: bool,
    label: Mutex<Option<String>>,
    /// Key of the graph this task was submitted to; 0 while unsubmitted.
    submitted_to: AtomicU64,
    task: Box<dyn Task>,
}

/// Reference-counted handle to a task.
///
/// The handle's [`TaskId`] is its identity. Cloning a handle does not clone
/// the task: the clone names the same graph node, which is how callers refer
/// to earlier submissions when declaring dependencies.
#[derive(Clone)]
pub struct TaskHandle {
    inner: Arc<TaskInner>,
}

impl TaskHandle {
    pub fn new(task: impl Task) -> Self {
        Self::build(Box::new(task), false)
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(f)
    }

    /// A task that dependents may name *before* it has been submitted.
    ///
    /// A dependency on an ordinary task that was never submitted is a usage
    /// error. A dependency on an any-order task instead waits until that task
    /// has been submitted and has finished.
    pub fn any_order(task: impl Task) -> Self {
        Self::build(Box::new(task), true)
    }

    /// An any-order task that does no work.
    ///
    /// Useful as a barrier: dependents wait on it, and whichever task
    /// completes a phase of work submits it.
    pub fn sync_point() -> Self {
        Self::build(Box::new(Noop), true)
    }

    /// Attach a label for log output.
    ///
    /// Clones share the label: they are the same graph node, so labelling
    /// one labels all of them.
    pub fn with_label(self, label: impl Into<String>) -> Self {
        *self.inner.label.lock() = Some(label.into());
        self
    }

    fn build(task: Box<dyn Task>, any_order: bool) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                id: TaskId::next(),
                any_order,
                label: Mutex::new(None),
                submitted_to: AtomicU64::new(0),
                task,
            }),
        }
    }

    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    pub fn is_any_order(&self) -> bool {
        self.inner.any_order
    }

    /// Label for diagnostics: the explicit label, else the task's own, else
    /// the id.
    pub fn label(&self) -> String {
        if let Some(label) = self.inner.label.lock().as_ref() {
            return label.clone();
        }
        let own = self.inner.task.label();
        if own.is_empty() {
            self.inner.id.to_string()
        } else {
            own.into_owned()
        }
    }

    pub(crate) fn run(&self) -> anyhow::Result<()> {
        self.inner.task.run()
    }

    /// Whether this handle was submitted to the graph with the given key.
    pub(crate) fn is_submitted_to(&self, graph: u64) -> bool {
        self.inner.submitted_to.load(Ordering::Acquire) == graph
    }

    /// Whether this handle was submitted to any graph.
    pub(crate) fn is_submitted(&self) -> bool {
        self.inner.submitted_to.load(Ordering::Acquire) != 0
    }

    pub(crate) fn mark_submitted(&self, graph: u64) {
        self.inner.submitted_to.store(graph, Ordering::Release);
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.inner.id)
            .field("label", &*self.inner.label.lock())
            .field("any_order", &self.inner.any_order)
            .finish()
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for TaskHandle {}

impl std::hash::Hash for TaskHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}
