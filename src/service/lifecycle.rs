// ABOUTME: Generic service lifecycle: network, image and container driven as one unit.
// ABOUTME: Retries container starts on host port conflicts with freshly drawn ports.

use super::classify;
use super::error::ServiceError;
use super::kind::ServiceKind;
use super::options::{NetworkSpec, ServiceOptions, ServiceOverrides};
use super::profile::{CleanStrategy, ServiceProfile};
use crate::config::FleetConfig;
use crate::fleet::Fleet;
use crate::handles::{ContainerHandle, ImageHandle, NetworkHandle};
use crate::runtime::{ContainerConfig, ContainerInfo};
use crate::types::ContainerId;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Starting,
    Running,
    Stopped,
    Removed,
}

/// The profile-independent half of a service.
pub struct ServiceCore {
    kind: ServiceKind,
    config: Arc<FleetConfig>,
    network: NetworkHandle,
    image: ImageHandle,
    container: ContainerHandle,
    options: ServiceOptions,
    state: ServiceState,
    start_attempts: u32,
}

impl ServiceCore {
    fn build(
        kind: ServiceKind,
        fleet: &Fleet,
        options: ServiceOptions,
    ) -> Result<Self, ServiceError> {
        let config = fleet.config();
        let spec = options.container_spec();
        let container_config = render(kind, &options)?;
        let network = NetworkHandle::new(
            fleet.runtime(),
            &spec.network.name,
            &spec.network.driver,
        );
        let image = ImageHandle::new(
            fleet.runtime(),
            container_config.image.clone(),
            config.private_registry.clone(),
        );

        Ok(Self {
            kind,
            config,
            network,
            image,
            container: ContainerHandle::new(fleet.runtime(), container_config),
            options,
            state: ServiceState::Uninitialized,
            start_attempts: 0,
        })
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.container.is_initialized()
    }

    pub fn container_id(&self) -> Option<&ContainerId> {
        self.container.id()
    }

    /// The create request the container was (or will be) created from.
    pub fn container_config(&self) -> &ContainerConfig {
        self.container.config()
    }

    pub fn start_attempts(&self) -> u32 {
        self.start_attempts
    }

    pub fn ip(&self) -> Result<&str, ServiceError> {
        self.container
            .ip()
            .ok_or(ServiceError::NotInitialized { kind: self.kind })
    }

    pub async fn inspect(&self) -> Result<ContainerInfo, ServiceError> {
        if !self.is_initialized() {
            return Err(ServiceError::NotInitialized { kind: self.kind });
        }
        self.container
            .inspect()
            .await
            .map_err(|source| ServiceError::Inspect {
                kind: self.kind,
                source,
            })
    }

    pub async fn is_running(&self) -> Result<bool, ServiceError> {
        Ok(self.inspect().await?.is_running())
    }

    async fn start_container(&mut self) -> Result<(), ServiceError> {
        let policy = self.config.retry;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            self.start_attempts += 1;

            let err = match self.container.start().await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            let message = err.to_string();
            if !classify::is_port_conflict(&message) {
                return Err(ServiceError::Start {
                    kind: self.kind,
                    source: err,
                });
            }
            if policy.exhausted(attempts) {
                // The container was never started; drop it so the service
                // reads as uninitialized again.
                if let Err(e) = self.container.remove().await {
                    tracing::warn!(
                        service = %self.kind,
                        error = %e,
                        "could not remove unstartable container"
                    );
                }
                return Err(ServiceError::RetryExhausted {
                    kind: self.kind,
                    attempts,
                    last_error: message,
                });
            }

            tracing::warn!(
                service = %self.kind,
                attempt = attempts,
                error = %message,
                "host port taken, retrying with new ports"
            );

            let options = self.options.regenerate_ports();
            let config = render(self.kind, &options)?;
            self.options = options;
            self.container
                .replace_config(config)
                .await
                .map_err(|source| ServiceError::Remove {
                    kind: self.kind,
                    source,
                })?;
        }
    }
}

fn render(kind: ServiceKind, options: &ServiceOptions) -> Result<ContainerConfig, ServiceError> {
    options
        .container_spec()
        .to_container_config(kind)
        .map_err(|message| ServiceError::InvalidOptions { kind, message })
}

/// One managed workload: a container plus the profile that knows how to
/// talk to it.
pub struct Service<P: ServiceProfile> {
    core: ServiceCore,
    profile: P,
}

impl<P: ServiceProfile> Service<P> {
    /// Build the service without touching the runtime.
    ///
    /// Options are merged as built-in defaults, then the fleet's per-kind
    /// overrides, then `overrides`.
    pub fn create(fleet: &Fleet, overrides: &ServiceOverrides) -> Result<Self, ServiceError> {
        let config = fleet.config();
        let merged = config.overrides_for(P::KIND).layered(overrides);
        let network = NetworkSpec {
            name: config.network.name.clone(),
            driver: config.network.driver.clone(),
        };
        let options = ServiceOptions::new(
            P::KIND,
            P::PORTS,
            P::default_settings(),
            P::default_container,
            network,
            merged,
        );

        Ok(Self {
            core: ServiceCore::build(P::KIND, fleet, options)?,
            profile: P::new(fleet),
        })
    }

    /// Ensure network and image, start the container and wait until the
    /// workload is ready.
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        let kind = P::KIND;
        tracing::info!(service = %kind, "starting service");
        self.core.state = ServiceState::Starting;

        match self.start_inner().await {
            Ok(()) => {
                self.core.state = ServiceState::Running;
                tracing::info!(
                    service = %kind,
                    ip = self.core.container.ip().unwrap_or("-"),
                    attempts = self.core.start_attempts,
                    "service running"
                );
                Ok(())
            }
            Err(e) => {
                self.core.state = if self.core.is_initialized() {
                    ServiceState::Stopped
                } else {
                    ServiceState::Uninitialized
                };
                Err(e)
            }
        }
    }

    async fn start_inner(&mut self) -> Result<(), ServiceError> {
        let kind = P::KIND;
        self.core
            .network
            .ensure()
            .await
            .map_err(|source| ServiceError::Network { kind, source })?;
        self.core
            .image
            .ensure()
            .await
            .map_err(|source| ServiceError::Image { kind, source })?;
        self.core.start_container().await?;
        self.profile.wait_ready(&self.core).await
    }

    pub async fn stop(&mut self) -> Result<(), ServiceError> {
        let kind = P::KIND;
        if !self.core.is_initialized() {
            return Err(ServiceError::NotInitialized { kind });
        }
        self.core
            .container
            .stop()
            .await
            .map_err(|source| ServiceError::Stop { kind, source })?;
        self.core.state = ServiceState::Stopped;
        tracing::info!(service = %kind, "service stopped");
        Ok(())
    }

    /// Remove the container; a service that was never created is left alone.
    pub async fn remove(&mut self) -> Result<(), ServiceError> {
        let kind = P::KIND;
        if !self.core.is_initialized() {
            return Ok(());
        }
        self.core
            .container
            .remove()
            .await
            .map_err(|source| ServiceError::Remove { kind, source })?;
        self.profile.reset();
        self.core.state = ServiceState::Removed;
        tracing::info!(service = %kind, "service removed");
        Ok(())
    }

    /// Bring the service back to a fresh running state.
    pub async fn clean(&mut self) -> Result<(), ServiceError> {
        match self.profile.clean_strategy() {
            CleanStrategy::Keep => Ok(()),
            CleanStrategy::Recreate => {
                tracing::debug!(service = %P::KIND, "recreating service");
                self.remove().await?;
                self.start().await
            }
        }
    }

    pub async fn connect(&self, other: &Service<P>) -> Result<(), ServiceError> {
        if !self.core.is_initialized() {
            return Err(ServiceError::NotInitialized { kind: P::KIND });
        }
        self.profile.peer_connect(&self.core, other).await
    }

    pub async fn disconnect(&self, other: &Service<P>) -> Result<(), ServiceError> {
        if !self.core.is_initialized() {
            return Err(ServiceError::NotInitialized { kind: P::KIND });
        }
        self.profile.peer_disconnect(&self.core, other).await
    }

    pub fn ip(&self) -> Result<&str, ServiceError> {
        self.core.ip()
    }

    pub fn is_initialized(&self) -> bool {
        self.core.is_initialized()
    }

    pub fn state(&self) -> ServiceState {
        self.core.state
    }

    pub fn kind(&self) -> ServiceKind {
        P::KIND
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.core.options
    }

    pub fn container_id(&self) -> Option<&ContainerId> {
        self.core.container_id()
    }

    pub fn start_attempts(&self) -> u32 {
        self.core.start_attempts
    }

    pub async fn inspect(&self) -> Result<ContainerInfo, ServiceError> {
        self.core.inspect().await
    }

    pub fn core(&self) -> &ServiceCore {
        &self.core
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }
}
