// ABOUTME: Liveness and version probe for the local container engine.
// ABOUTME: Used once when a fleet connects, before any service is touched.

use super::sealed::Sealed;
use super::shared_types::EngineVersion;
use async_trait::async_trait;

#[async_trait]
pub trait RuntimeInfo: Sealed + Send + Sync {
    /// Fails when the engine socket does not answer.
    async fn ping(&self) -> Result<(), RuntimeInfoError>;

    async fn version(&self) -> Result<EngineVersion, RuntimeInfoError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    #[error("engine unreachable: {0}")]
    ConnectionFailed(String),

    /// The engine answered but could not describe itself.
    #[error("engine error: {0}")]
    Runtime(String),
}
