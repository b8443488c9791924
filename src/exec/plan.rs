// src/exec/plan.rs

//! Turning a validated job file into pool submissions.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::PoolError;
use crate::exec::command::CommandTask;
use crate::pool::ThreadPool;
use crate::task::TaskHandle;

/// Add every task of `cfg` to `pool`, wiring `after` lists as dependencies.
///
/// Tasks are added in topological order so each dependency is already
/// known to the pool when its dependents arrive. Returns the handle of every
/// task, keyed by name.
pub fn schedule_config(
    pool: &ThreadPool,
    cfg: &ConfigFile,
) -> Result<BTreeMap<String, TaskHandle>, PoolError> {
    let mut handles: BTreeMap<String, TaskHandle> = BTreeMap::new();

    for name in cfg.topological_order() {
        let Some(task) = cfg.task.get(name) else {
            continue;
        };

        let handle = TaskHandle::new(CommandTask::new(name.clone(), task.cmd.clone()));
        let dependencies: Vec<TaskHandle> = task
            .after
            .iter()
            .filter_map(|dep| handles.get(dep).cloned())
            .collect();

        debug!(
            task = %name,
            deps = ?task.after,
            off_pool = task.off_pool,
            "adding task to pool"
        );

        if task.off_pool {
            pool.add_task_with_dependencies_off_pool(&dependencies, [handle.clone()])?;
        } else {
            pool.add_task_with_dependencies(&dependencies, [handle.clone()])?;
        }

        handles.insert(name.clone(), handle);
    }

    Ok(handles)
}
