// ABOUTME: Drive workloads: the storage API and the chain sync process.
// ABOUTME: Both run from the drive image; only the API publishes a port.

use crate::fleet::Fleet;
use crate::service::{ContainerSpec, PortSlot, PortTable, Service, ServiceKind, ServiceProfile, Settings};

const IMAGE: &str = "axerunners/drive:latest";

pub struct DriveApi;

impl ServiceProfile for DriveApi {
    const KIND: ServiceKind = ServiceKind::DriveApi;
    const PORTS: &'static [PortSlot] = &[PortSlot::new("rpc", 6000, 6998)];
    const IMAGE: &'static str = IMAGE;

    fn default_container(ports: &PortTable, _settings: &Settings) -> ContainerSpec {
        let rpc = ports.port("rpc");
        ContainerSpec::new(Self::IMAGE)
            .publish(rpc, rpc)
            .cmd(["npm", "run", "api"])
            .env("API_RPC_PORT", rpc)
    }

    fn new(_fleet: &Fleet) -> Self {
        DriveApi
    }
}

impl Service<DriveApi> {
    pub fn rpc_port(&self) -> u16 {
        self.options().port("rpc")
    }
}

pub struct DriveSync;

impl ServiceProfile for DriveSync {
    const KIND: ServiceKind = ServiceKind::DriveSync;
    const IMAGE: &'static str = IMAGE;

    fn default_container(_ports: &PortTable, _settings: &Settings) -> ContainerSpec {
        ContainerSpec::new(Self::IMAGE).cmd(["npm", "run", "sync"])
    }

    fn new(_fleet: &Fleet) -> Self {
        DriveSync
    }
}
