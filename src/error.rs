// ABOUTME: Application-level error type for configuration and the CLI.
// ABOUTME: Wraps the layered service, compose and runtime errors with thiserror.

use crate::compose::ComposeError;
use crate::runtime::{ContainerError, RuntimeError};
use crate::service::ServiceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("failed to reap container {id}: {source}")]
    Reap {
        id: String,
        #[source]
        source: ContainerError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
