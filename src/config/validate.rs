// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskpoolError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskpoolError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let order = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.pool, raw.task, order))
    }
}

/// Validate the raw file and return its tasks in topological order.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<Vec<String>> {
    ensure_has_tasks(cfg)?;
    validate_pool_section(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskpoolError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pool_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pool.threads == Some(0) {
        return Err(TaskpoolError::ConfigError(
            "[pool].threads must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(prefix) = &cfg.pool.thread_name_prefix {
        if prefix.trim().is_empty() {
            return Err(TaskpoolError::ConfigError(
                "[pool].thread_name_prefix must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(TaskpoolError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }
        for dep in task.after.iter() {
            if dep == name {
                return Err(TaskpoolError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(TaskpoolError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<Vec<String>> {
    // Edge direction: dep -> task. For
    //   [task.B]
    //   after = ["A"]
    // we add edge A -> B, so a topological order lists A before B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(TaskpoolError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                node
            )))
        }
    }
}
