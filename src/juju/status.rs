// ABOUTME: Unit readiness via `juju status --format json`.
// ABOUTME: Polls until the service's first unit reports started with a public address.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

/// Connection metadata for a deployed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    pub unit: String,
    pub public_address: String,
    pub machine: Option<String>,
    pub agent_state: String,
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("failed to run juju status: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("juju status exited with status {code:?}: {stderr}")]
    Status { code: Option<i32>, stderr: String },

    #[error("cannot decode juju status output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unit {unit} is in an error state: {state}")]
    UnitError { unit: String, state: String },

    #[error("no unit of {0} became ready within {1:?}")]
    Timeout(String, Duration),
}

/// Blocks until a unit of the given service is ready.
#[async_trait]
pub trait UnitWatcher: Send + Sync {
    async fn wait_for_unit(&self, service: &str) -> Result<UnitInfo, WaitError>;
}

#[derive(Debug, Deserialize)]
struct StatusOutput {
    #[serde(default)]
    services: HashMap<String, ServiceStatus>,
}

#[derive(Debug, Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    units: HashMap<String, UnitStatus>,
}

#[derive(Debug, Deserialize)]
struct UnitStatus {
    #[serde(rename = "agent-state", default)]
    agent_state: Option<String>,
    #[serde(rename = "public-address", default)]
    public_address: Option<String>,
    #[serde(default)]
    machine: Option<String>,
}

/// Polls `juju status` until the deployed unit reports itself started.
///
/// An agent state containing "error" fails immediately; anything else short
/// of "started" keeps polling until the timeout.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    binary: PathBuf,
    timeout: Duration,
    interval: Duration,
}

impl StatusPoller {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("juju"),
            timeout: Duration::from_secs(600),
            interval: Duration::from_secs(5),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    async fn sample(&self, service: &str) -> Result<Option<UnitInfo>, WaitError> {
        let output = Command::new(&self.binary)
            .arg("status")
            .arg(service)
            .args(["--format", "json"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(WaitError::Spawn)?;

        if !output.status.success() {
            return Err(WaitError::Status {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let status: StatusOutput = serde_json::from_slice(&output.stdout)?;
        find_ready_unit(&status, service)
    }
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UnitWatcher for StatusPoller {
    async fn wait_for_unit(&self, service: &str) -> Result<UnitInfo, WaitError> {
        let start = Instant::now();
        loop {
            if let Some(info) = self.sample(service).await? {
                tracing::info!(unit = %info.unit, address = %info.public_address, "unit ready");
                return Ok(info);
            }
            if start.elapsed() >= self.timeout {
                return Err(WaitError::Timeout(service.to_string(), self.timeout));
            }
            tracing::debug!(service, "unit not ready yet");
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Pick the first ready unit of `service`, unit names sorted for determinism.
fn find_ready_unit(status: &StatusOutput, service: &str) -> Result<Option<UnitInfo>, WaitError> {
    let Some(service_status) = status.services.get(service) else {
        return Ok(None);
    };

    let mut units: Vec<_> = service_status.units.iter().collect();
    units.sort_by(|a, b| a.0.cmp(b.0));

    for (name, unit) in units {
        let state = unit.agent_state.as_deref().unwrap_or("pending");
        if state.contains("error") {
            return Err(WaitError::UnitError {
                unit: name.clone(),
                state: state.to_string(),
            });
        }
        if state == "started"
            && let Some(address) = &unit.public_address
        {
            return Ok(Some(UnitInfo {
                unit: name.clone(),
                public_address: address.clone(),
                machine: unit.machine.clone(),
                agent_state: state.to_string(),
            }));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> StatusOutput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn started_unit_with_address_is_ready() {
        let status = decode(
            r#"{"services": {"haproxy": {"units": {"haproxy/0": {
                "agent-state": "started",
                "public-address": "unit.example.com",
                "machine": "1"
            }}}}}"#,
        );
        let info = find_ready_unit(&status, "haproxy").unwrap().unwrap();
        assert_eq!(info.unit, "haproxy/0");
        assert_eq!(info.public_address, "unit.example.com");
        assert_eq!(info.machine.as_deref(), Some("1"));
        assert_eq!(info.agent_state, "started");
    }

    #[test]
    fn pending_unit_is_not_ready() {
        let status = decode(
            r#"{"services": {"haproxy": {"units": {"haproxy/0": {
                "agent-state": "pending"
            }}}}}"#,
        );
        assert!(find_ready_unit(&status, "haproxy").unwrap().is_none());
    }

    #[test]
    fn started_unit_without_address_keeps_waiting() {
        let status = decode(
            r#"{"services": {"haproxy": {"units": {"haproxy/0": {
                "agent-state": "started"
            }}}}}"#,
        );
        assert!(find_ready_unit(&status, "haproxy").unwrap().is_none());
    }

    #[test]
    fn error_state_fails_immediately() {
        let status = decode(
            r#"{"services": {"haproxy": {"units": {"haproxy/0": {
                "agent-state": "install-error"
            }}}}}"#,
        );
        let err = find_ready_unit(&status, "haproxy").unwrap_err();
        match err {
            WaitError::UnitError { unit, state } => {
                assert_eq!(unit, "haproxy/0");
                assert_eq!(state, "install-error");
            }
            other => panic!("expected UnitError, got {other:?}"),
        }
    }

    #[test]
    fn unknown_service_is_not_ready() {
        let status = decode(r#"{"services": {}}"#);
        assert!(find_ready_unit(&status, "haproxy").unwrap().is_none());
    }

    #[test]
    fn missing_agent_state_counts_as_pending() {
        let status = decode(
            r#"{"services": {"haproxy": {"units": {"haproxy/0": {
                "public-address": "unit.example.com"
            }}}}}"#,
        );
        assert!(find_ready_unit(&status, "haproxy").unwrap().is_none());
    }

    fn shim(dir: &std::path::Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("juju");
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[tokio::test]
    async fn poller_returns_the_ready_unit() {
        let dir = tempfile::tempdir().unwrap();
        let script = shim(
            dir.path(),
            "#!/bin/sh\necho '{\"services\":{\"haproxy\":{\"units\":{\"haproxy/0\":\
             {\"agent-state\":\"started\",\"public-address\":\"unit.example.com\"}}}}}'\n",
        );
        let poller = StatusPoller::new()
            .with_binary(script)
            .with_timeout(Duration::from_secs(5))
            .with_interval(Duration::from_millis(10));
        let info = poller.wait_for_unit("haproxy").await.unwrap();
        assert_eq!(info.public_address, "unit.example.com");
    }

    #[tokio::test]
    async fn poller_times_out_on_a_pending_unit() {
        let dir = tempfile::tempdir().unwrap();
        let script = shim(
            dir.path(),
            "#!/bin/sh\necho '{\"services\":{\"haproxy\":{\"units\":{\"haproxy/0\":\
             {\"agent-state\":\"pending\"}}}}}'\n",
        );
        let poller = StatusPoller::new()
            .with_binary(script)
            .with_timeout(Duration::ZERO);
        let err = poller.wait_for_unit("haproxy").await.unwrap_err();
        assert!(matches!(err, WaitError::Timeout(_, _)));
    }

    #[tokio::test]
    async fn poller_propagates_a_failing_status_command() {
        let dir = tempfile::tempdir().unwrap();
        let script = shim(dir.path(), "#!/bin/sh\necho 'no environment' >&2\nexit 1\n");
        let poller = StatusPoller::new().with_binary(script);
        let err = poller.wait_for_unit("haproxy").await.unwrap_err();
        match err {
            WaitError::Status { code, stderr } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "no environment");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn first_unit_by_name_wins() {
        let status = decode(
            r#"{"services": {"haproxy": {"units": {
                "haproxy/1": {"agent-state": "started", "public-address": "b.example.com"},
                "haproxy/0": {"agent-state": "started", "public-address": "a.example.com"}
            }}}}"#,
        );
        let info = find_ready_unit(&status, "haproxy").unwrap().unwrap();
        assert_eq!(info.unit, "haproxy/0");
        assert_eq!(info.public_address, "a.example.com");
    }
}
