// src/config/mod.rs

//! Configuration: pool settings and the TOML job-file model used by the CLI.
//!
//! - [`pool`] defines [`PoolConfig`], the only thing the library needs.
//! - [`model`] maps the job file (`[pool]`, `[task.<name>]`).
//! - [`loader`] reads job files; [`validate`] checks them.

pub mod loader;
pub mod model;
pub mod pool;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, PoolSection, RawConfigFile, TaskConfig};
pub use pool::{DEFAULT_THREAD_NAME_PREFIX, PoolConfig, default_thread_count};
