//! CLI subprocess step dispatcher.
//!
//! Spawns a configured CLI binary per step, feeds it the generated prompt on
//! stdin, and collects its stdout as the dispatch's output text. A hard
//! timeout sends SIGTERM first and escalates to SIGKILL if the process
//! hasn't exited shortly after (spec §4.5 "Dispatch timeout").

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AgentConfig;
use crate::domain::ports::dispatcher::{DispatchOutcome, DispatchStatus, StepDispatcher};

#[derive(Debug, Clone)]
pub struct CliSubprocessConfig {
    pub binary_path: String,
    pub args: Vec<String>,
    /// Grace period between SIGTERM and SIGKILL once the timeout fires.
    pub kill_grace: Duration,
}

impl Default for CliSubprocessConfig {
    fn default() -> Self {
        Self {
            binary_path: "agentloop-worker".to_string(),
            args: Vec::new(),
            kill_grace: Duration::from_secs(5),
        }
    }
}

pub struct CliSubprocessDispatcher {
    config: CliSubprocessConfig,
}

impl CliSubprocessDispatcher {
    #[must_use]
    pub fn new(config: CliSubprocessConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StepDispatcher for CliSubprocessDispatcher {
    async fn dispatch(
        &self,
        step_id: Uuid,
        prompt: &str,
        timeout: Duration,
        _agent_config: Option<&AgentConfig>,
    ) -> DomainResult<DispatchOutcome> {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| DomainError::Dispatcher(format!("failed to spawn worker for step {step_id}: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| DomainError::Dispatcher(format!("failed to write prompt: {e}")))?;
        }

        let pid = child.id();

        let wait_with_output = async {
            let stdout = child.stdout.take();
            let mut lines_out = String::new();
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    lines_out.push_str(&line);
                    lines_out.push('\n');
                }
            }
            let status = child.wait().await;
            (status, lines_out)
        };

        match tokio::time::timeout(timeout, wait_with_output).await {
            Ok((Ok(status), output)) => Ok(DispatchOutcome {
                status: if status.success() { DispatchStatus::Completed } else { DispatchStatus::Failed },
                text: output,
            }),
            Ok((Err(e), _)) => Err(DomainError::Dispatcher(format!("worker process error: {e}"))),
            Err(_) => {
                terminate_process(pid, self.config.kill_grace).await;
                Err(DomainError::Dispatcher(format!(
                    "step {step_id} dispatch timed out after {timeout:?}"
                )))
            }
        }
    }
}

async fn terminate_process(pid: Option<u32>, grace: Duration) {
    let Some(pid) = pid else { return };
    #[allow(clippy::cast_possible_wrap)]
    let nix_pid = Pid::from_raw(pid as i32);
    let _ = signal::kill(nix_pid, Signal::SIGTERM);
    tokio::time::sleep(grace).await;
    let _ = signal::kill(nix_pid, Signal::SIGKILL);
}
