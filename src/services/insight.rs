// ABOUTME: Block explorer API (Insight) workload.

use crate::fleet::Fleet;
use crate::service::{
    ContainerSpec, PortSlot, PortTable, Service, ServiceError, ServiceKind, ServiceProfile,
    Settings,
};

pub const API_PATH: &str = "/insight-api";

pub struct Insight;

impl ServiceProfile for Insight {
    const KIND: ServiceKind = ServiceKind::Insight;
    const PORTS: &'static [PortSlot] = &[PortSlot::new("api", 3001, 3998)];
    const IMAGE: &'static str = "axerunners/insight-api:latest";

    fn default_container(ports: &PortTable, _settings: &Settings) -> ContainerSpec {
        let api = ports.port("api");
        ContainerSpec::new(Self::IMAGE)
            .publish(api, api)
            .env("API_PORT", api)
    }

    fn new(_fleet: &Fleet) -> Self {
        Insight
    }
}

impl Service<Insight> {
    pub fn api_port(&self) -> u16 {
        self.options().port("api")
    }

    /// Base URL of the API as seen from the service network.
    pub fn uri(&self) -> Result<String, ServiceError> {
        Ok(format!("http://{}:{}{}", self.ip()?, self.api_port(), API_PATH))
    }
}
