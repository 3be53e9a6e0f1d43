// ABOUTME: Document database (MongoDB) workload.

use crate::fleet::Fleet;
use crate::service::{
    CleanStrategy, ContainerSpec, PortSlot, PortTable, Service, ServiceError, ServiceKind,
    ServiceProfile, Settings,
};

pub const MONGO_PORT: u16 = 27017;

pub struct DocumentStore;

impl ServiceProfile for DocumentStore {
    const KIND: ServiceKind = ServiceKind::DocumentStore;
    const PORTS: &'static [PortSlot] = &[PortSlot::new("mongo", 27001, 27998)];
    const IMAGE: &'static str = "mongo:3.6";

    fn default_container(ports: &PortTable, _settings: &Settings) -> ContainerSpec {
        ContainerSpec::new(Self::IMAGE).publish(ports.port("mongo"), MONGO_PORT)
    }

    fn new(_fleet: &Fleet) -> Self {
        DocumentStore
    }

    fn clean_strategy(&self) -> CleanStrategy {
        CleanStrategy::Recreate
    }
}

impl Service<DocumentStore> {
    /// Connection URL for other containers on the network.
    pub fn mongodb_url(&self) -> Result<String, ServiceError> {
        Ok(format!("mongodb://{}:{}", self.ip()?, MONGO_PORT))
    }

    pub fn host_port(&self) -> u16 {
        self.options().port("mongo")
    }
}
