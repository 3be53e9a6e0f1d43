// ABOUTME: Lifecycle wrapper around a single runtime container.
// ABOUTME: Holds the current create request, the created id and the last inspect result.

use crate::runtime::{ContainerConfig, ContainerError, ContainerInfo, SharedRuntime};
use crate::types::ContainerId;
use std::time::Duration;

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ContainerHandle {
    runtime: SharedRuntime,
    config: ContainerConfig,
    id: Option<ContainerId>,
    info: Option<ContainerInfo>,
}

impl ContainerHandle {
    pub fn new(runtime: SharedRuntime, config: ContainerConfig) -> Self {
        Self {
            runtime,
            config,
            id: None,
            info: None,
        }
    }

    pub fn id(&self) -> Option<&ContainerId> {
        self.id.as_ref()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// True once the container exists in the runtime.
    pub fn is_initialized(&self) -> bool {
        self.id.is_some()
    }

    /// Create the container if needed, then start it.
    ///
    /// Starting a running container is a no-op.
    pub async fn start(&mut self) -> Result<(), ContainerError> {
        if let Some(id) = &self.id {
            match self.runtime.inspect_container(id).await {
                Ok(info) if info.is_running() => {
                    self.info = Some(info);
                    return Ok(());
                }
                Ok(_) => {}
                Err(ContainerError::NotFound(_)) => {
                    tracing::debug!(id = %id.short(), "container disappeared, recreating");
                    self.id = None;
                    self.info = None;
                }
                Err(e) => return Err(e),
            }
        }

        let id = match &self.id {
            Some(id) => id.clone(),
            None => {
                let id = self.runtime.create_container(&self.config).await?;
                tracing::debug!(id = %id.short(), image = %self.config.image, "created container");
                self.id = Some(id.clone());
                id
            }
        };

        match self.runtime.start_container(&id).await {
            Ok(()) | Err(ContainerError::AlreadyRunning(_)) => {}
            Err(e) => return Err(e),
        }

        self.info = Some(self.runtime.inspect_container(&id).await?);
        Ok(())
    }

    /// Swap the create request; an existing container is discarded so the
    /// next start recreates it.
    pub async fn replace_config(&mut self, config: ContainerConfig) -> Result<(), ContainerError> {
        if let Some(id) = self.id.take() {
            match self.runtime.remove_container(&id, true, true).await {
                Ok(()) | Err(ContainerError::NotFound(_)) => {}
                Err(e) => {
                    self.id = Some(id);
                    return Err(e);
                }
            }
        }
        self.info = None;
        self.config = config;
        Ok(())
    }

    /// Stop the container; the cached IP stays available.
    pub async fn stop(&mut self) -> Result<(), ContainerError> {
        let id = self.require_id()?;
        self.runtime.stop_container(id, STOP_TIMEOUT).await
    }

    /// Force-remove the container and its anonymous volumes.
    pub async fn remove(&mut self) -> Result<(), ContainerError> {
        let Some(id) = self.id.clone() else {
            return Ok(());
        };
        match self.runtime.remove_container(&id, true, true).await {
            Ok(()) | Err(ContainerError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.id = None;
        self.info = None;
        Ok(())
    }

    pub async fn inspect(&self) -> Result<ContainerInfo, ContainerError> {
        let id = self.require_id()?;
        self.runtime.inspect_container(id).await
    }

    /// IP on the container's network, as of the last successful start.
    pub fn ip(&self) -> Option<&str> {
        let network = self.config.network.as_deref()?;
        self.info.as_ref()?.ip_on(network)
    }

    fn require_id(&self) -> Result<&ContainerId, ContainerError> {
        self.id
            .as_ref()
            .ok_or_else(|| ContainerError::NotFound("container has not been created".into()))
    }
}
