//! External process runner - spawns the program and captures its output

use crate::runner::{Invocation, StepFailure, StepOutcome, StepRunner};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs invocations as real child processes
///
/// The working directory and environment overrides are handed to each child
/// process; the parent's own directory and environment are never touched, so
/// several invocations may run at the same time.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StepRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> StepOutcome {
        debug!(
            "Spawning {} {:?} in {:?}",
            invocation.program, invocation.args, invocation.work_dir
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.work_dir {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| {
            warn!("Failed to launch {}: {}", invocation.program, e);
            StepFailure::Launch {
                program: invocation.program.clone(),
                message: e.to_string(),
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            warn!("{} exited with code {}: {}", invocation.program, code, stderr);
            return Err(StepFailure::Exit {
                program: invocation.program.clone(),
                code,
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "{} returned {} bytes of output",
            invocation.program,
            stdout.len()
        );

        Ok(stdout)
    }
}
