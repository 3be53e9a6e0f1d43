// ABOUTME: In-memory container runtime for unit tests.
// ABOUTME: Emulates host port conflicts, IP assignment and scripted failures.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, ImageError, ImageOps, NetworkConfig, NetworkDetails, NetworkError,
    NetworkInfo, NetworkOps, NetworkSettings, RegistryAuth,
};
use crate::types::{ContainerId, ImageRef, NetworkId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct FakeContainer {
    pub config: ContainerConfig,
    pub running: bool,
    pub ip: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct PullRecord {
    pub image: String,
    pub authenticated: bool,
}

#[derive(Default)]
struct State {
    containers: HashMap<String, FakeContainer>,
    networks: HashMap<String, NetworkDetails>,
    images: HashSet<String>,
    external_ports: HashSet<u16>,
    start_failures: VecDeque<String>,
    remove_failures: HashMap<String, String>,
    pulls: Vec<PullRecord>,
    network_creates: usize,
    starts: usize,
    next_id: u64,
    next_ip: u8,
}

/// Runtime double shared by the unit tests.
#[derive(Default)]
pub(crate) struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a host port as taken by something outside the fleet.
    pub fn occupy_port(&self, port: u16) {
        self.state.lock().external_ports.insert(port);
    }

    /// Make the next start fail with the given engine message.
    pub fn fail_next_start(&self, message: &str) {
        self.state
            .lock()
            .start_failures
            .push_back(message.to_string());
    }

    /// Make removing `id` fail with the given engine message.
    pub fn fail_remove(&self, id: &ContainerId, message: &str) {
        self.state
            .lock()
            .remove_failures
            .insert(id.to_string(), message.to_string());
    }

    pub fn add_image(&self, reference: &str) {
        self.state.lock().images.insert(reference.to_string());
    }

    pub fn pulls(&self) -> Vec<PullRecord> {
        self.state.lock().pulls.clone()
    }

    pub fn network_creates(&self) -> usize {
        self.state.lock().network_creates
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub fn container_count(&self) -> usize {
        self.state.lock().containers.len()
    }

    pub fn running_count(&self) -> usize {
        self.state
            .lock()
            .containers
            .values()
            .filter(|c| c.running)
            .count()
    }

    pub fn container(&self, id: &ContainerId) -> Option<FakeContainer> {
        self.state.lock().containers.get(id.as_str()).cloned()
    }

    /// Drop a container behind the fleet's back.
    pub fn forget(&self, id: &ContainerId) {
        self.state.lock().containers.remove(id.as_str());
    }

    /// Stop every container, as if the engine had crashed them.
    pub fn kill_all(&self) {
        for c in self.state.lock().containers.values_mut() {
            c.running = false;
        }
    }

    /// RPC port of the running chain node reachable at `p2p_address`
    /// (`ip:port`), read from its `-port` and `-rpcport` flags.
    pub fn rpc_port_behind(&self, p2p_address: &str) -> Option<u16> {
        self.chain_nodes()
            .into_iter()
            .find(|(address, _)| address == p2p_address)
            .map(|(_, rpc_port)| rpc_port)
    }

    /// `ip:port` of the running chain node serving RPC on `rpc_port`.
    pub fn p2p_address_of(&self, rpc_port: u16) -> Option<String> {
        self.chain_nodes()
            .into_iter()
            .find(|(_, port)| *port == rpc_port)
            .map(|(address, _)| address)
    }

    fn chain_nodes(&self) -> Vec<(String, u16)> {
        self.state
            .lock()
            .containers
            .values()
            .filter(|c| c.running)
            .filter_map(|c| {
                let ip = c.ip.as_ref()?;
                let cmd = c.config.command.as_ref()?;
                let flag = |name: &str| {
                    cmd.iter()
                        .find_map(|arg| arg.strip_prefix(name)?.parse::<u16>().ok())
                };
                Some((format!("{}:{}", ip, flag("-port=")?), flag("-rpcport=")?))
            })
            .collect()
    }
}

fn conflict_message(port: u16) -> String {
    format!(
        "driver failed programming external connectivity on endpoint fake: \
         Bind for 0.0.0.0:{} failed: port is already allocated",
        port
    )
}

impl Sealed for FakeRuntime {}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let mut state = self.state.lock();
        state.pulls.push(PullRecord {
            image: reference.to_string(),
            authenticated: auth.is_some(),
        });
        state.images.insert(reference.to_string());
        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        Ok(self.state.lock().images.contains(&reference.to_string()))
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let mut state = self.state.lock();
        if !state.images.contains(&config.image.to_string()) {
            return Err(ContainerError::ImageNotFound(config.image.to_string()));
        }
        if let Some(network) = &config.network
            && !state.networks.contains_key(network)
        {
            return Err(ContainerError::InvalidConfig(format!(
                "network {} not found",
                network
            )));
        }
        state.next_id += 1;
        let id = format!("fake{:012}", state.next_id);
        state.containers.insert(
            id.clone(),
            FakeContainer {
                config: config.clone(),
                running: false,
                ip: None,
            },
        );
        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state.starts += 1;
        let container = state
            .containers
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if container.running {
            return Err(ContainerError::AlreadyRunning(id.to_string()));
        }
        if let Some(message) = state.start_failures.pop_front() {
            return Err(ContainerError::Runtime(message));
        }

        let taken: HashSet<u16> = state
            .containers
            .iter()
            .filter(|(other, c)| other.as_str() != id.as_str() && c.running)
            .flat_map(|(_, c)| c.config.ports.iter().filter_map(|p| p.host_port))
            .chain(state.external_ports.iter().copied())
            .collect();
        if let Some(port) = container
            .config
            .ports
            .iter()
            .filter_map(|p| p.host_port)
            .find(|p| taken.contains(p))
        {
            return Err(ContainerError::Runtime(conflict_message(port)));
        }

        state.next_ip += 1;
        let ip = format!("172.28.0.{}", state.next_ip + 1);
        if let Some(c) = state.containers.get_mut(id.as_str()) {
            c.running = true;
            if c.config.network.is_some() {
                c.ip = Some(ip);
            }
        }
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        let container = state
            .containers
            .get_mut(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if !container.running {
            return Err(ContainerError::NotRunning(id.to_string()));
        }
        container.running = false;
        Ok(())
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        force: bool,
        _volumes: bool,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        if let Some(message) = state.remove_failures.remove(id.as_str()) {
            return Err(ContainerError::Runtime(message));
        }
        match state.containers.get(id.as_str()) {
            None => Err(ContainerError::NotFound(id.to_string())),
            Some(c) if c.running && !force => Err(ContainerError::Runtime(format!(
                "cannot remove running container {}",
                id
            ))),
            Some(_) => {
                state.containers.remove(id.as_str());
                Ok(())
            }
        }
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let state = self.state.lock();
        let c = state
            .containers
            .get(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        let mut networks = HashMap::new();
        if let Some(network) = &c.config.network {
            networks.insert(
                network.clone(),
                NetworkInfo {
                    network_id: state
                        .networks
                        .get(network)
                        .map(|n| n.id.clone())
                        .unwrap_or_default(),
                    ip_address: c.ip.clone().unwrap_or_default(),
                },
            );
        }

        let argv: Vec<String> = c
            .config
            .entrypoint
            .iter()
            .flatten()
            .chain(c.config.command.iter().flatten())
            .cloned()
            .collect();

        Ok(ContainerInfo {
            id: id.clone(),
            name: c.config.name.clone().unwrap_or_default(),
            image: c.config.image.to_string(),
            state: if c.running {
                ContainerState::Running
            } else {
                ContainerState::Created
            },
            args: argv.into_iter().skip(1).collect(),
            env: c.config.env.clone(),
            mounts: c.config.volumes.iter().map(|v| v.target.clone()).collect(),
            labels: c.config.labels.clone(),
            network_settings: NetworkSettings { networks },
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let state = self.state.lock();
        Ok(state
            .containers
            .iter()
            .filter(|(_, c)| filters.all || c.running)
            .filter(|(_, c)| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.config.labels.get(k) == Some(v))
            })
            .map(|(id, c)| ContainerSummary {
                id: ContainerId::new(id.clone()),
                image: c.config.image.to_string(),
                state: if c.running { "running" } else { "created" }.to_string(),
                labels: c.config.labels.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl NetworkOps for FakeRuntime {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        let mut state = self.state.lock();
        state.network_creates += 1;
        if state.networks.contains_key(&config.name) {
            return Err(NetworkError::AlreadyExists(config.name.clone()));
        }
        let id = format!("net{:012}", state.network_creates);
        state.networks.insert(
            config.name.clone(),
            NetworkDetails {
                id: id.clone(),
                name: config.name.clone(),
                driver: config.driver.clone().unwrap_or_else(|| "bridge".into()),
            },
        );
        Ok(NetworkId::new(id))
    }

    async fn inspect_network(&self, name: &str) -> Result<NetworkDetails, NetworkError> {
        self.state
            .lock()
            .networks
            .get(name)
            .cloned()
            .ok_or_else(|| NetworkError::NotFound(name.to_string()))
    }
}
