// ABOUTME: Application-wide error types for charmhand.
// ABOUTME: Uses thiserror for ergonomic error handling.

use thiserror::Error;

use crate::deploy::DeployError;
use crate::repository::StageError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid option '{0}': expected KEY=VALUE")]
    InvalidOption(String),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
