// src/dag/graph.rs

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::dag::claim::Claim;
use crate::dag::identity::{IdentityMap, IdentitySet};
use crate::dag::task_record::{TaskRecord, TaskState};
use crate::errors::PoolError;
use crate::task::TaskHandle;
use crate::types::{ExecutionMode, TaskId};

/// In-memory dependency bookkeeping for one pool.
///
/// It is responsible for:
/// - registering submitted tasks as ready or blocked
/// - handing ready tasks to workers, one claim at a time
/// - unblocking dependents when a task completes
/// - remembering the first failure, after which nothing new starts
///
/// Every live task is in exactly one of `ready`, `executing` or `blocked`.
/// Off-pool tasks skip `ready`: when their dependencies are satisfied they go
/// straight to `executing` and are handed back to the caller to launch.
///
/// Finished tasks are not remembered here. Each handle carries a stamp with
/// the key of the graph it was submitted to, which is how a finished
/// dependency is told apart from one that was never submitted.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Non-zero key stamped on every handle submitted to this graph.
    key: u64,
    /// Every live (submitted, unfinished) task.
    records: IdentityMap<TaskRecord>,
    /// Ready in-pool tasks, in the order they became ready.
    ready: VecDeque<TaskId>,
    executing: IdentitySet,
    blocked: IdentitySet,
    /// Unfinished task -> dependents waiting on it.
    blocker_of: IdentityMap<Vec<TaskId>>,
    first_error: Option<PoolError>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

static NEXT_GRAPH_KEY: AtomicU64 = AtomicU64::new(1);

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            key: NEXT_GRAPH_KEY.fetch_add(1, Ordering::Relaxed),
            records: IdentityMap::new(),
            ready: VecDeque::new(),
            executing: IdentitySet::new(),
            blocked: IdentitySet::new(),
            blocker_of: IdentityMap::new(),
            first_error: None,
        }
    }

    /// Register `tasks`, each waiting on every entry of `dependencies`.
    ///
    /// Dependencies that already finished are ignored. A handle can be
    /// submitted once, to one graph. The whole batch is validated before
    /// anything is mutated, so an `Err` leaves the graph untouched.
    ///
    /// Returns the off-pool tasks that became executing and must be launched
    /// by the caller.
    pub fn submit(
        &mut self,
        dependencies: &[TaskHandle],
        tasks: Vec<TaskHandle>,
        mode: ExecutionMode,
    ) -> Result<Vec<TaskHandle>, PoolError> {
        self.validate_submission(dependencies, &tasks)?;

        if mode == ExecutionMode::OffPool && self.first_error.is_some() {
            for task in &tasks {
                debug!(
                    task = %task.label(),
                    "run already failed; not launching off-pool task"
                );
            }
            return Ok(Vec::new());
        }

        let still_pending: IdentitySet = dependencies
            .iter()
            .filter(|dep| self.is_unfinished(dep))
            .map(TaskHandle::id)
            .collect();

        let mut launches = Vec::new();

        for task in tasks {
            let id = task.id();
            task.mark_submitted(self.key);

            if still_pending.is_empty() {
                debug!(task = %task.label(), ?mode, "dependencies satisfied on submission");
                self.records
                    .insert(id, TaskRecord::new(task, mode, IdentitySet::new()));
                self.release(id, &mut launches);
                continue;
            }

            debug!(
                task = %task.label(),
                ?mode,
                pending = still_pending.len(),
                "task blocked on unfinished dependencies"
            );
            for dep in still_pending.iter() {
                self.blocker_of.entry(dep).or_default().push(id);
            }
            self.blocked.insert(id);
            self.records
                .insert(id, TaskRecord::new(task, mode, still_pending.clone()));
        }

        Ok(launches)
    }

    /// Claim the next ready task for a worker.
    pub fn claim(&mut self) -> Claim {
        if self.is_drained() {
            return Claim::Drained;
        }
        if self.first_error.is_some() {
            return Claim::Aborted;
        }

        let Some(id) = self.ready.pop_front() else {
            return Claim::Wait;
        };

        match self.records.get(&id) {
            Some(record) => {
                self.executing.insert(id);
                Claim::Run(record.handle.clone())
            }
            None => {
                warn!(task = %id, "ready task has no record; skipping");
                Claim::Wait
            }
        }
    }

    /// Mark a task as finished with the given outcome.
    ///
    /// The task is forgotten. If no failure has been recorded, dependents
    /// whose last unmet dependency was this task become ready; off-pool ones
    /// are returned (already executing) for the caller to launch.
    pub fn complete(&mut self, id: TaskId, outcome: Result<(), PoolError>) -> Vec<TaskHandle> {
        if !self.executing.remove(id) {
            warn!(task = %id, "completion for a task that was not executing");
        }
        self.records.remove(&id);

        if let Err(err) = outcome {
            self.record_failure(err);
        }

        let dependents = self.blocker_of.remove(&id).unwrap_or_default();

        let mut launches = Vec::new();
        if self.first_error.is_some() {
            return launches;
        }

        for dependent in dependents {
            let Some(record) = self.records.get_mut(&dependent) else {
                continue;
            };
            record.pending.remove(id);
            if record.pending.is_empty() {
                debug!(
                    task = %record.handle.label(),
                    after = %id,
                    "last dependency finished; unblocking"
                );
                self.blocked.remove(dependent);
                self.release(dependent, &mut launches);
            }
        }

        launches
    }

    /// Forget an executing task that will never run (its thread could not
    /// be launched after a failure). Dependents are not released.
    pub fn abandon(&mut self, id: TaskId) {
        self.executing.remove(id);
        self.records.remove(&id);
        self.blocker_of.remove(&id);
    }

    /// Forget every task that has not run: ready, blocked and any
    /// bookkeeping pointing at them.
    ///
    /// Called once a run is over. The records are returned rather than
    /// dropped so the caller can release them outside its lock, since
    /// dropping a task drops whatever its closure captured.
    pub fn clear_unfinished(&mut self) -> Vec<TaskRecord> {
        if !self.ready.is_empty() || !self.blocked.is_empty() {
            debug!(
                ready = self.ready.len(),
                blocked = self.blocked.len(),
                "discarding tasks that never ran"
            );
        }
        self.ready.clear();
        self.blocked = IdentitySet::new();
        self.executing = IdentitySet::new();
        self.blocker_of.clear();
        self.records.drain().map(|(_, record)| record).collect()
    }

    /// Record a failure. The first one wins; later ones are logged and
    /// dropped.
    ///
    /// Returns `true` if this call recorded the failure.
    pub fn record_failure(&mut self, err: PoolError) -> bool {
        if let Some(first) = &self.first_error {
            debug!(
                error = %err,
                first = %first,
                "discarding failure; an earlier one is already recorded"
            );
            return false;
        }

        warn!(error = %err, "first failure recorded; no further tasks will start");
        self.first_error = Some(err);
        true
    }

    /// `true` when nothing is ready and nothing is executing.
    pub fn is_drained(&self) -> bool {
        self.executing.is_empty() && self.ready.is_empty()
    }

    pub fn has_failed(&self) -> bool {
        self.first_error.is_some()
    }

    pub fn first_error(&self) -> Option<&PoolError> {
        self.first_error.as_ref()
    }

    pub fn take_first_error(&mut self) -> Option<PoolError> {
        self.first_error.take()
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub fn executing_len(&self) -> usize {
        self.executing.len()
    }

    pub fn blocked_len(&self) -> usize {
        self.blocked.len()
    }

    /// Where the given task currently is.
    pub fn state_of(&self, task: &TaskHandle) -> TaskState {
        let id = task.id();
        if self.executing.contains(id) {
            TaskState::Executing
        } else if self.blocked.contains(id) {
            TaskState::Blocked
        } else if self.records.contains_key(&id) {
            TaskState::Ready
        } else if task.is_submitted_to(self.key) {
            TaskState::Finished
        } else {
            TaskState::Unknown
        }
    }

    /// Dependents currently registered as waiting on `id`.
    pub fn dependents_of(&self, id: TaskId) -> &[TaskId] {
        self.blocker_of
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a dependency still has to finish.
    ///
    /// Any-order tasks that have not been submitted yet count as
    /// unfinished; they will be waited for once they arrive.
    fn is_unfinished(&self, dep: &TaskHandle) -> bool {
        let id = dep.id();
        self.records.contains_key(&id) || (dep.is_any_order() && !dep.is_submitted_to(self.key))
    }

    /// Move a task with no pending dependencies to `ready`, or to
    /// `executing` (collected into `launches`) if it runs off-pool.
    fn release(&mut self, id: TaskId, launches: &mut Vec<TaskHandle>) {
        let Some(record) = self.records.get(&id) else {
            return;
        };
        match record.mode {
            ExecutionMode::InPool => self.ready.push_back(id),
            ExecutionMode::OffPool => {
                self.executing.insert(id);
                launches.push(record.handle.clone());
            }
        }
    }

    fn validate_submission(
        &self,
        dependencies: &[TaskHandle],
        tasks: &[TaskHandle],
    ) -> Result<(), PoolError> {
        let mut batch = IdentitySet::new();

        for task in tasks {
            let id = task.id();
            if task.is_submitted() || !batch.insert(id) {
                return Err(PoolError::DuplicateTask(id));
            }

            for dep in dependencies {
                if dep.id() == id {
                    return Err(PoolError::SelfDependency(id));
                }
                if !dep.is_any_order() && !dep.is_submitted_to(self.key) {
                    return Err(PoolError::UnknownDependency {
                        task: id,
                        dependency: dep.id(),
                    });
                }
            }
        }

        Ok(())
    }
}
