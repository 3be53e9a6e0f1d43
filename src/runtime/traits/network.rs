// ABOUTME: Network capability: the user-defined bridge every fixture joins.
// ABOUTME: Services look the network up first and create it only when missing.

use super::sealed::Sealed;
use super::shared_types::{NetworkConfig, NetworkDetails};
use crate::types::NetworkId;
use async_trait::async_trait;

#[async_trait]
pub trait NetworkOps: Sealed + Send + Sync {
    /// Two services racing to create the same network both succeed; the
    /// loser sees `NetworkError::AlreadyExists`.
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError>;

    async fn inspect_network(&self, name: &str) -> Result<NetworkDetails, NetworkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("no such network: {0}")]
    NotFound(String),

    #[error("network already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Runtime(String),
}
