// ABOUTME: Front-end gateways served from the dapi image.
// ABOUTME: DapiCore answers JSON-RPC; TxFilterStream serves the gRPC transaction stream.

use crate::fleet::Fleet;
use crate::service::{ContainerSpec, PortSlot, PortTable, Service, ServiceKind, ServiceProfile, Settings};

const IMAGE: &str = "axerunners/dapi:latest";

pub struct DapiCore;

impl ServiceProfile for DapiCore {
    const KIND: ServiceKind = ServiceKind::DapiCore;
    const PORTS: &'static [PortSlot] = &[PortSlot::new("rpc", 20002, 29998)];
    const IMAGE: &'static str = IMAGE;

    fn default_container(ports: &PortTable, _settings: &Settings) -> ContainerSpec {
        let rpc = ports.port("rpc");
        ContainerSpec::new(Self::IMAGE)
            .publish(rpc, rpc)
            .cmd(["npm", "run", "core"])
            .env("RPC_SERVER_PORT", rpc)
    }

    fn new(_fleet: &Fleet) -> Self {
        DapiCore
    }
}

impl Service<DapiCore> {
    pub fn rpc_port(&self) -> u16 {
        self.options().port("rpc")
    }
}

pub struct TxFilterStream;

impl ServiceProfile for TxFilterStream {
    const KIND: ServiceKind = ServiceKind::TxFilterStream;
    const PORTS: &'static [PortSlot] = &[PortSlot::new("grpc", 20002, 29998)];
    const IMAGE: &'static str = IMAGE;

    fn default_container(ports: &PortTable, _settings: &Settings) -> ContainerSpec {
        let grpc = ports.port("grpc");
        ContainerSpec::new(Self::IMAGE)
            .publish(grpc, grpc)
            .cmd(["npm", "run", "tx-filter-stream"])
            .env("GRPC_SERVER_PORT", grpc)
    }

    fn new(_fleet: &Fleet) -> Self {
        TxFilterStream
    }
}

impl Service<TxFilterStream> {
    pub fn grpc_port(&self) -> u16 {
        self.options().port("grpc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceOverrides;
    use crate::testing::{fake_fleet, init_tracing, quick_config};

    #[tokio::test]
    async fn regenerated_port_is_reinjected() {
        init_tracing();
        let (fake, fleet) = fake_fleet(quick_config());
        fake.occupy_port(20500);
        let overrides = ServiceOverrides::default().port("rpc", 20500);
        let mut dapi = Service::<DapiCore>::create(&fleet, &overrides).unwrap();

        dapi.start().await.unwrap();

        let port = dapi.rpc_port();
        assert_ne!(port, 20500);
        let info = dapi.inspect().await.unwrap();
        assert!(info.env.contains(&format!("RPC_SERVER_PORT={}", port)));
    }

    #[tokio::test]
    async fn stream_runs_its_own_script() {
        init_tracing();
        let (_fake, fleet) = fake_fleet(quick_config());
        let mut stream =
            Service::<TxFilterStream>::create(&fleet, &ServiceOverrides::default()).unwrap();
        stream.start().await.unwrap();

        let info = stream.inspect().await.unwrap();
        assert_eq!(info.args.last().map(String::as_str), Some("tx-filter-stream"));
        assert!(info.env.contains(&format!("GRPC_SERVER_PORT={}", stream.grpc_port())));
    }
}
