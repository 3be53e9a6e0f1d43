// ABOUTME: Content-addressed store (IPFS) workload.
// ABOUTME: Initialises an isolated node on start and exposes its API multiaddr.

use crate::fleet::Fleet;
use crate::service::{
    CleanStrategy, ContainerSpec, PortSlot, PortTable, Service, ServiceError, ServiceKind,
    ServiceProfile, Settings,
};

/// API port inside the container.
pub const API_PORT: u16 = 5001;

const INIT_SCRIPT: &str = "ipfs init \
    && ipfs config --json Bootstrap [] \
    && ipfs config --json Discovery.MDNS.Enabled false \
    && ipfs config Addresses.API /ip4/0.0.0.0/tcp/5001 \
    && ipfs config Addresses.Gateway /ip4/0.0.0.0/tcp/8080 \
    && ipfs daemon";

pub struct ContentStore;

impl ServiceProfile for ContentStore {
    const KIND: ServiceKind = ServiceKind::ContentStore;
    const PORTS: &'static [PortSlot] = &[PortSlot::new("api", 10001, 19998)];
    const IMAGE: &'static str = "ipfs/go-ipfs:v0.4.18";

    fn default_container(ports: &PortTable, _settings: &Settings) -> ContainerSpec {
        ContainerSpec::new(Self::IMAGE)
            .publish(ports.port("api"), API_PORT)
            .entrypoint(["/sbin/tini", "--", "/bin/sh", "-c", INIT_SCRIPT])
    }

    fn new(_fleet: &Fleet) -> Self {
        ContentStore
    }

    fn clean_strategy(&self) -> CleanStrategy {
        CleanStrategy::Recreate
    }
}

impl Service<ContentStore> {
    /// `/ip4/<ip>/tcp/5001`, reachable from other containers on the network.
    pub fn multiaddr(&self) -> Result<String, ServiceError> {
        Ok(format!("/ip4/{}/tcp/{}", self.ip()?, API_PORT))
    }

    /// Host port the API is published on.
    pub fn api_port(&self) -> u16 {
        self.options().port("api")
    }
}
