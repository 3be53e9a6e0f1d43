// ABOUTME: Per-workload capabilities plugged into the generic lifecycle engine.
// ABOUTME: Defaults describe a plain container; profiles override readiness, peering and cleaning.

use super::error::ServiceError;
use super::kind::ServiceKind;
use super::lifecycle::{Service, ServiceCore};
use super::options::{ContainerSpec, Settings};
use super::ports::{PortSlot, PortTable};
use crate::fleet::Fleet;
use async_trait::async_trait;

/// What `clean()` does for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanStrategy {
    /// Nothing; the service has no state worth resetting.
    Keep,
    /// Remove the container and start a fresh one.
    Recreate,
}

#[async_trait]
pub trait ServiceProfile: Send + Sync + Sized + 'static {
    const KIND: ServiceKind;

    /// Logical ports and the ranges they are drawn from.
    const PORTS: &'static [PortSlot] = &[];

    const IMAGE: &'static str;

    fn default_settings() -> Settings {
        Settings::new()
    }

    /// Built-in container spec for the given ports and settings.
    fn default_container(ports: &PortTable, settings: &Settings) -> ContainerSpec;

    /// Fresh per-instance state.
    fn new(fleet: &Fleet) -> Self;

    /// Block until the workload answers. Called after every successful
    /// container start.
    async fn wait_ready(&mut self, _core: &ServiceCore) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn peer_connect(
        &self,
        _core: &ServiceCore,
        _peer: &Service<Self>,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn peer_disconnect(
        &self,
        _core: &ServiceCore,
        _peer: &Service<Self>,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    fn clean_strategy(&self) -> CleanStrategy {
        CleanStrategy::Keep
    }

    /// Drop per-instance state after the container is removed.
    fn reset(&mut self) {}
}
