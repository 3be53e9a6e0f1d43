// ABOUTME: Errors surfaced by service lifecycle operations.
// ABOUTME: Runtime errors are wrapped with the service kind; their messages stay intact.

use super::kind::ServiceKind;
use crate::runtime::{ContainerError, ImageError, NetworkError};
use crate::services::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind}: network setup failed: {source}")]
    Network {
        kind: ServiceKind,
        #[source]
        source: NetworkError,
    },

    #[error("{kind}: image unavailable: {source}")]
    Image {
        kind: ServiceKind,
        #[source]
        source: ImageError,
    },

    #[error("{kind}: start failed: {source}")]
    Start {
        kind: ServiceKind,
        #[source]
        source: ContainerError,
    },

    #[error("{kind}: stop failed: {source}")]
    Stop {
        kind: ServiceKind,
        #[source]
        source: ContainerError,
    },

    #[error("{kind}: remove failed: {source}")]
    Remove {
        kind: ServiceKind,
        #[source]
        source: ContainerError,
    },

    #[error("{kind}: inspect failed: {source}")]
    Inspect {
        kind: ServiceKind,
        #[source]
        source: ContainerError,
    },

    #[error("{kind}: instance should be started before")]
    NotInitialized { kind: ServiceKind },

    #[error("{kind}: gave up after {attempts} attempt(s): {last_error}")]
    RetryExhausted {
        kind: ServiceKind,
        attempts: u32,
        last_error: String,
    },

    #[error("{kind}: {source}")]
    Rpc {
        kind: ServiceKind,
        #[source]
        source: RpcError,
    },

    #[error("{kind}: container stopped while waiting for readiness: {last_error}")]
    NotRunning {
        kind: ServiceKind,
        last_error: String,
    },

    #[error("{kind}: invalid options: {message}")]
    InvalidOptions { kind: ServiceKind, message: String },

    #[error("invalid number of instances: {0}")]
    InvalidInstanceCount(usize),
}

impl ServiceError {
    pub fn kind(&self) -> Option<ServiceKind> {
        match self {
            ServiceError::Network { kind, .. }
            | ServiceError::Image { kind, .. }
            | ServiceError::Start { kind, .. }
            | ServiceError::Stop { kind, .. }
            | ServiceError::Remove { kind, .. }
            | ServiceError::Inspect { kind, .. }
            | ServiceError::NotInitialized { kind }
            | ServiceError::RetryExhausted { kind, .. }
            | ServiceError::Rpc { kind, .. }
            | ServiceError::NotRunning { kind, .. }
            | ServiceError::InvalidOptions { kind, .. } => Some(*kind),
            ServiceError::InvalidInstanceCount(_) => None,
        }
    }
}
