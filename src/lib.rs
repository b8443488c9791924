// src/lib.rs

//! A thread pool whose tasks can depend on each other and can add more
//! tasks while they run.
//!
//! The library part is [`ThreadPool`] plus [`TaskHandle`]; the rest of the
//! crate is the `taskpool` binary, which runs a TOML file of shell commands
//! with `after = [...]` dependencies through the pool.

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pool;
pub mod task;
pub mod types;

use std::num::NonZeroUsize;

use anyhow::{Context, Result};
use tracing::{debug, info};

pub use crate::config::PoolConfig;
pub use crate::errors::{PoolError, TaskpoolError};
pub use crate::pool::{ThreadPool, ThreadPoolBuilder};
pub use crate::task::{Task, TaskHandle};
pub use crate::types::{ExecutionMode, TaskId};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::exec::schedule_config;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job-file loading and validation
/// - CLI overrides of the `[pool]` section
/// - scheduling every task on a fresh pool, and running it once
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = &args.config;
    let cfg = load_and_validate(config_path)
        .with_context(|| format!("loading job file {}", config_path.display()))?;

    let pool_config = apply_overrides(cfg.pool_config(), &args);

    if args.dry_run {
        print_dry_run(&cfg, &pool_config);
        return Ok(());
    }

    run_config(&cfg, pool_config)?;
    Ok(())
}

/// Run every task of a validated job file on a new pool.
pub fn run_config(cfg: &ConfigFile, pool_config: PoolConfig) -> crate::errors::Result<()> {
    let pool = ThreadPool::new(pool_config);
    let handles = schedule_config(&pool, cfg)?;
    info!(tasks = handles.len(), "job file scheduled; executing");

    pool.execute()?;

    info!(tasks = handles.len(), "all tasks completed");
    Ok(())
}

/// CLI flags win over the job file.
fn apply_overrides(mut config: PoolConfig, args: &CliArgs) -> PoolConfig {
    if let Some(threads) = args
        .threads
        .and_then(|n| usize::try_from(n).ok())
        .and_then(NonZeroUsize::new)
    {
        config = config.with_thread_count(threads);
    }
    if let Some(prefix) = &args.thread_name_prefix {
        config = config.with_thread_name_prefix(prefix.as_str());
    }
    config
}

/// Simple dry-run output: pool settings, then tasks in execution order.
fn print_dry_run(cfg: &ConfigFile, pool_config: &PoolConfig) {
    println!("taskpool dry-run");
    println!("  pool.threads = {}", pool_config.thread_count);
    println!(
        "  pool.thread_name_prefix = {}",
        pool_config.thread_name_prefix
    );
    println!();

    println!("tasks ({}):", cfg.task.len());
    for name in cfg.topological_order() {
        let Some(task) = cfg.task.get(name) else {
            continue;
        };
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if task.off_pool {
            println!("      off_pool: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
