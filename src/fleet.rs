// ABOUTME: Fleet: the runtime, configuration and RPC connector every service is built from.
// ABOUTME: Factories for single services and for peer-connected groups of instances.

use crate::config::FleetConfig;
use crate::runtime::{self, RuntimeError, SharedRuntime};
use crate::service::{Service, ServiceError, ServiceOverrides, ServiceProfile};
use crate::services::{ChainNode, HttpRpcConnector, RpcConnector, UnavailableConnector};
use std::sync::Arc;
use std::time::Duration;

/// Per-call limit for chain node RPC requests.
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared context for creating services.
///
/// Cloning is cheap; clones share the runtime connection and configuration.
#[derive(Clone)]
pub struct Fleet {
    runtime: SharedRuntime,
    config: Arc<FleetConfig>,
    rpc: Arc<dyn RpcConnector>,
}

impl Fleet {
    /// When the HTTP client for chain node RPC cannot be built, the fleet
    /// still works for every other service and chain nodes fail readiness
    /// with the build error.
    pub fn new(runtime: SharedRuntime, config: FleetConfig) -> Self {
        let rpc: Arc<dyn RpcConnector> = match HttpRpcConnector::new(RPC_TIMEOUT) {
            Ok(connector) => Arc::new(connector),
            Err(e) => {
                tracing::warn!(error = %e, "chain node RPC client could not be built");
                Arc::new(UnavailableConnector::new(e.to_string()))
            }
        };
        Self {
            runtime,
            config: Arc::new(config),
            rpc,
        }
    }

    /// Connect to the local Docker or Podman socket.
    pub async fn connect_local(config: FleetConfig) -> Result<Self, RuntimeError> {
        let runtime = runtime::connect_local(config.runtime.as_ref()).await?;
        Ok(Self::new(runtime, config))
    }

    /// Replace how chain node RPC clients are built.
    pub fn with_rpc_connector(mut self, rpc: Arc<dyn RpcConnector>) -> Self {
        self.rpc = rpc;
        self
    }

    pub fn runtime(&self) -> SharedRuntime {
        self.runtime.clone()
    }

    pub fn config(&self) -> Arc<FleetConfig> {
        self.config.clone()
    }

    pub fn rpc_connector(&self) -> Arc<dyn RpcConnector> {
        self.rpc.clone()
    }

    /// Build a service without starting it.
    pub fn create<P: ServiceProfile>(
        &self,
        overrides: &ServiceOverrides,
    ) -> Result<Service<P>, ServiceError> {
        Service::create(self, overrides)
    }

    /// Build and start a service.
    pub async fn start<P: ServiceProfile>(
        &self,
        overrides: &ServiceOverrides,
    ) -> Result<Service<P>, ServiceError> {
        let mut service = self.create::<P>(overrides)?;
        service.start().await?;
        Ok(service)
    }

    /// Start `n` instances one after another, connecting each new instance
    /// to the previous one.
    pub async fn start_many<P: ServiceProfile>(
        &self,
        n: usize,
        overrides: &ServiceOverrides,
    ) -> Result<Vec<Service<P>>, ServiceError> {
        if n < 1 {
            return Err(ServiceError::InvalidInstanceCount(n));
        }

        let mut instances: Vec<Service<P>> = Vec::with_capacity(n);
        for _ in 0..n {
            let instance = self.start::<P>(overrides).await?;
            if let Some(previous) = instances.last() {
                previous.connect(&instance).await?;
            }
            instances.push(instance);
        }

        tracing::debug!(service = %P::KIND, count = n, "instances started");
        Ok(instances)
    }

    /// Start `n` chain nodes and peer them in a chain.
    ///
    /// With more than one node the first mines a block before peering, and
    /// the call returns after the configured propagation wait, so every node
    /// reports a block count of one.
    pub async fn start_chain_nodes(
        &self,
        n: usize,
        overrides: &ServiceOverrides,
    ) -> Result<Vec<Service<ChainNode>>, ServiceError> {
        if n < 1 {
            return Err(ServiceError::InvalidInstanceCount(n));
        }

        let mut nodes: Vec<Service<ChainNode>> = Vec::with_capacity(n);
        for i in 0..n {
            let node = self.start::<ChainNode>(overrides).await?;
            if i == 0 && n > 1 {
                node.generate(1).await?;
            }
            if let Some(previous) = nodes.last() {
                previous.connect(&node).await?;
            }
            nodes.push(node);
        }

        if n > 1 {
            let wait = self.config.propagation_wait;
            tracing::debug!(nodes = n, wait = ?wait, "waiting for block propagation");
            tokio::time::sleep(wait).await;
        }
        Ok(nodes)
    }
}
