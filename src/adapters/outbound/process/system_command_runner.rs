use crate::ports::outbound::CommandRunner;
use crate::shared::error::BomError;
use crate::shared::Result;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// SystemCommandRunner adapter running ecosystem tools as subprocesses
///
/// Standard output is captured and returned. A non-zero exit status is a
/// `BomError::ToolFailure` carrying the tool's trimmed stderr. When a
/// timeout is configured the child is killed once it elapses.
pub struct SystemCommandRunner {
    timeout: Option<Duration>,
}

impl SystemCommandRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn command_line(program: &str, args: &[&str]) -> String {
        std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[&str], dir: Option<&Path>) -> Result<Vec<u8>> {
        let command_line = Self::command_line(program, args);
        debug!(command = %command_line, dir = ?dir, "Running external tool");

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        let output = command.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output).await.map_err(|_| {
                BomError::ToolFailure {
                    tool: command_line.clone(),
                    details: format!("timed out after {}s", limit.as_secs()),
                }
            })?,
            None => output.await,
        }
        .map_err(|e| BomError::ToolFailure {
            tool: command_line.clone(),
            details: format!("cannot start process: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BomError::ToolFailure {
                tool: command_line,
                details: format!("exited with {}: {}", output.status, stderr.trim()),
            }
            .into());
        }

        Ok(output.stdout)
    }
}
