// ABOUTME: Container capability a managed service drives through its lifecycle.
// ABOUTME: Also lists labelled containers so stale fixtures can be reaped.

use super::sealed::Sealed;
use super::shared_types::{ContainerConfig, ContainerInfo};
use crate::types::ContainerId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError>;

    /// Host port conflicts surface here, as `ContainerError::Runtime` with
    /// the engine's own wording.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError>;

    /// `volumes` also drops the container's anonymous volumes, which is how
    /// a fixture loses its chain or database state.
    async fn remove_container(
        &self,
        id: &ContainerId,
        force: bool,
        volumes: bool,
    ) -> Result<(), ContainerError>;

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;
}

/// Label selector for [`ContainerOps::list_containers`].
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Every pair must match.
    pub labels: HashMap<String, String>,
    /// Include exited and created containers.
    pub all: bool,
}

#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub image: String,
    /// Engine state word, e.g. `running` or `exited`.
    pub state: String,
    pub labels: HashMap<String, String>,
}

/// `Runtime` keeps the engine's message verbatim; start failures are
/// classified by inspecting that text.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("no such container: {0}")]
    NotFound(String),

    #[error("container is not running: {0}")]
    NotRunning(String),

    #[error("container is already running: {0}")]
    AlreadyRunning(String),

    #[error("image is not present locally: {0}")]
    ImageNotFound(String),

    #[error("engine rejected the container config: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Runtime(String),
}
