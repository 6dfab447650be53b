// ABOUTME: Capability trait for invoking the juju CLI, plus the subprocess implementation.
// ABOUTME: Orchestration code depends on the trait so tests can record invocations.

mod status;

pub use status::{StatusPoller, UnitInfo, UnitWatcher, WaitError};

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum JujuError {
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Capability to invoke the juju client.
///
/// Success means the process exited zero; there is no output to return, the
/// deploy and expose verbs are fire-and-check.
#[async_trait]
pub trait JujuRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<(), JujuError>;
}

/// Runs a real `juju` binary as a subprocess.
#[derive(Debug, Clone)]
pub struct JujuCli {
    binary: PathBuf,
}

impl JujuCli {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("juju"),
        }
    }

    /// Use an alternate client binary (absolute path or PATH lookup).
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut parts = vec![self.binary.display().to_string()];
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }
}

impl Default for JujuCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JujuRunner for JujuCli {
    async fn run(&self, args: &[String]) -> Result<(), JujuError> {
        tracing::debug!("running {}", self.command_line(args));

        let output = Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| JujuError::Spawn {
                command: self.command_line(args),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(JujuError::Failed {
                command: self.command_line(args),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
