// src/exec/command.rs

//! Shell commands as pool tasks.

use std::borrow::Cow;
use std::process::{Command, Stdio};

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, info};

use crate::task::Task;

/// Returned (inside [`PoolError::TaskFailed`](crate::PoolError::TaskFailed))
/// when a command exits unsuccessfully.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task '{task}' exited with status {exit_code}")]
pub struct CommandFailed {
    pub task: String,
    /// Exit code, or -1 if the process was killed by a signal.
    pub exit_code: i32,
}

/// A named shell command run through `sh -c` (`cmd /C` on Windows).
///
/// Stdout lines are logged at `info`, stderr lines at `debug`.
#[derive(Debug, Clone)]
pub struct CommandTask {
    name: String,
    cmd: String,
}

impl CommandTask {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
        }
    }

    fn shell_command(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        }
    }
}

impl Task for CommandTask {
    fn run(&self) -> anyhow::Result<()> {
        info!(task = %self.name, cmd = %self.cmd, "starting task process");

        let output = self
            .shell_command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawning process for task '{}'", self.name))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            info!(task = %self.name, "stdout: {}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(task = %self.name, "stderr: {}", line);
        }

        let exit_code = output.status.code().unwrap_or(-1);
        info!(
            task = %self.name,
            exit_code,
            success = output.status.success(),
            "task process exited"
        );

        if !output.status.success() {
            return Err(CommandFailed {
                task: self.name.clone(),
                exit_code,
            }
            .into());
        }

        Ok(())
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}
