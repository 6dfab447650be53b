// ABOUTME: Test support utilities.
// ABOUTME: Recording fakes for the juju runner and the unit watcher.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use charmhand::juju::{JujuError, JujuRunner, UnitInfo, UnitWatcher, WaitError};

/// Records every juju invocation; optionally fails on a given verb.
pub struct RecordingJuju {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    fail_on: Option<&'static str>,
}

#[allow(dead_code)]
impl RecordingJuju {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: None,
        }
    }

    /// Fail any invocation whose first argument matches `verb`.
    pub fn failing_on(verb: &'static str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: Some(verb),
        }
    }

    /// Handle to the recorded invocations, usable after the runner moves.
    pub fn calls_handle(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl JujuRunner for RecordingJuju {
    async fn run(&self, args: &[String]) -> Result<(), JujuError> {
        self.calls.lock().unwrap().push(args.to_vec());
        if let Some(verb) = self.fail_on
            && args.first().map(String::as_str) == Some(verb)
        {
            return Err(JujuError::Failed {
                command: format!("juju {}", args.join(" ")),
                code: Some(1),
                stderr: "forced failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Always-ready watcher returning a fixed unit record.
pub struct StubWatcher {
    info: UnitInfo,
    requested: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl StubWatcher {
    pub fn ready(address: &str) -> Self {
        Self {
            info: UnitInfo {
                unit: "haproxy/0".to_string(),
                public_address: address.to_string(),
                machine: Some("1".to_string()),
                agent_state: "started".to_string(),
            },
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn info(&self) -> UnitInfo {
        self.info.clone()
    }

    /// Handle to the services waited on, usable after the watcher moves.
    pub fn requested_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requested)
    }
}

#[async_trait]
impl UnitWatcher for StubWatcher {
    async fn wait_for_unit(&self, service: &str) -> Result<UnitInfo, WaitError> {
        self.requested.lock().unwrap().push(service.to_string());
        Ok(self.info.clone())
    }
}
