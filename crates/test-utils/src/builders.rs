#![allow(dead_code)]

use std::collections::BTreeMap;

use taskpool::config::{ConfigFile, PoolSection, RawConfigFile, TaskConfig};
use taskpool::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                pool: PoolSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.pool.threads = Some(threads);
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: &str) -> Self {
        self.config.pool.thread_name_prefix = Some(prefix.to_string());
        self
    }

    /// The raw, unvalidated file.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    /// Validate, returning the error instead of panicking.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                after: vec![],
                off_pool: false,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn off_pool(mut self, val: bool) -> Self {
        self.task.off_pool = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
