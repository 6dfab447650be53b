// ABOUTME: Deployment orchestration: stage, deploy, expose, wait.
// ABOUTME: Each step fails fast; nothing is retried or rolled back.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::config_file::{ConfigFileError, make_charm_config_file};
use crate::juju::{JujuError, JujuRunner, UnitInfo, UnitWatcher, WaitError};
use crate::repository::{DEFAULT_SERIES, StageError, Stager};

/// Scheme prefix marking a charm deployed from a local repository.
pub const LOCAL_SCHEME: &str = "local:";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error(transparent)]
    Juju(#[from] JujuError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error("cannot locate default charm source: {0}")]
    NoDefaultSource(#[source] std::io::Error),
}

/// Optional knobs for a single deployment.
#[derive(Debug, Clone, Default)]
pub struct DeployParams {
    /// Charm options, written to a config file and passed via `--config`.
    pub options: Option<BTreeMap<String, String>>,
    /// Machine to place the unit on, passed via `--force-machine`.
    pub force_machine: Option<u32>,
    /// Charm source tree; defaults to the installation-relative location.
    pub charm_source: Option<PathBuf>,
    /// Target series; defaults to [`DEFAULT_SERIES`].
    pub series: Option<String>,
}

/// Sequences a full deployment against an injected juju runner and watcher.
pub struct Deployer<R, W> {
    juju: R,
    watcher: W,
    stager: Stager,
}

impl<R: JujuRunner, W: UnitWatcher> Deployer<R, W> {
    pub fn new(juju: R, watcher: W) -> Self {
        Self {
            juju,
            watcher,
            stager: Stager::new(),
        }
    }

    /// Use a stager with a non-default exclusion policy.
    pub fn with_stager(juju: R, watcher: W, stager: Stager) -> Self {
        Self {
            juju,
            watcher,
            stager,
        }
    }

    /// Deploy `charm` from a freshly staged local repository, expose it and
    /// wait for its unit, returning the unit's connection metadata unchanged.
    ///
    /// Steps run in strict order and the first failure aborts the rest: a
    /// failed expose leaves the charm deployed but unexposed, and no staged
    /// repository or config file is ever cleaned up.
    pub async fn deploy(&self, charm: &str, params: DeployParams) -> Result<UnitInfo, DeployError> {
        let series = params.series.as_deref().unwrap_or(DEFAULT_SERIES);
        let source = match params.charm_source {
            Some(ref path) => path.clone(),
            None => default_charm_source()?,
        };

        let repository = self.stager.stage(&source, series)?;
        info!(charm, repository = %repository.display(), "staged charm repository");

        // juju is positional about these flags: --force-machine before
        // --config, and the local charm reference last.
        let mut args = vec![
            "deploy".to_string(),
            "--repository".to_string(),
            repository.display().to_string(),
        ];
        if let Some(machine) = params.force_machine {
            args.push("--force-machine".to_string());
            args.push(machine.to_string());
        }
        if let Some(options) = params.options.as_ref().filter(|o| !o.is_empty()) {
            let config_path = make_charm_config_file(charm, options)?;
            args.push("--config".to_string());
            args.push(config_path.display().to_string());
        }
        args.push(format!("{LOCAL_SCHEME}{charm}"));

        self.juju.run(&args).await?;
        info!(charm, "deployed");

        self.juju
            .run(&["expose".to_string(), charm.to_string()])
            .await?;
        info!(charm, "exposed");

        let unit = self.watcher.wait_for_unit(charm).await?;
        Ok(unit)
    }
}

/// Default charm source: the parent of the directory holding the running
/// binary, mirroring an installation-relative layout.
fn default_charm_source() -> Result<PathBuf, DeployError> {
    let mut path = std::env::current_exe().map_err(DeployError::NoDefaultSource)?;
    path.pop();
    path.pop();
    Ok(path)
}
