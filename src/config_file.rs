// ABOUTME: Writes charm option maps to the YAML file `juju deploy --config` reads.
// ABOUTME: Files are persisted under the system temp dir and never deleted here.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to write charm config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize charm options: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("failed to persist charm config file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Write `{service: options}` to a fresh YAML file, returning its path.
///
/// juju expects the options keyed by service name. The file is persisted
/// (not deleted on drop); cleanup belongs to whoever reaps the temp dir.
pub fn make_charm_config_file(
    service: &str,
    options: &BTreeMap<String, String>,
) -> Result<PathBuf, ConfigFileError> {
    let mut keyed = BTreeMap::new();
    keyed.insert(service.to_string(), options);

    let mut file = tempfile::Builder::new()
        .prefix("charm-config-")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(serde_yaml::to_string(&keyed)?.as_bytes())?;

    let (_, path) = file.keep()?;
    Ok(path)
}
