// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Talks to Docker (or Podman's Docker-compatible API) over a unix socket.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, EngineVersion, ImageError, ImageOps, NetworkConfig, NetworkDetails,
    NetworkError, NetworkInfo, NetworkOps, NetworkSettings, RegistryAuth, RuntimeInfo,
    RuntimeInfoError,
};
use crate::runtime::types::{DetectedRuntime, RuntimeType};
use crate::types::{ContainerId, ImageRef, NetworkId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::models::{ContainerCreateBody, HostConfig, Mount, MountTypeEnum, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, InspectNetworkOptions,
    ListContainersOptions, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;

/// Status code and body of an engine error response.
fn engine_status(e: &bollard::errors::Error) -> Option<(u16, &str)> {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => Some((*status_code, message.as_str())),
        _ => None,
    }
}

fn image_pull_error(e: bollard::errors::Error, image: &str) -> ImageError {
    match engine_status(&e) {
        Some((404, _)) => ImageError::NotFound(image.to_string()),
        Some((401 | 403, _)) => ImageError::AuthenticationFailed(format!("{}: {}", image, e)),
        _ => ImageError::PullFailed(format!("{}: {}", image, e)),
    }
}

/// Which container call failed; the same status means different things
/// depending on it.
#[derive(Clone, Copy)]
enum Call {
    Create,
    Start,
    Stop,
    Lookup,
}

fn container_error(call: Call) -> impl Fn(bollard::errors::Error) -> ContainerError {
    move |e| {
        let Some((code, message)) = engine_status(&e) else {
            return ContainerError::Runtime(e.to_string());
        };
        let message = message.to_string();
        match (call, code) {
            (Call::Create, 404) => ContainerError::ImageNotFound(message),
            (Call::Create, 400) => ContainerError::InvalidConfig(message),
            (Call::Start | Call::Stop | Call::Lookup, 404) => ContainerError::NotFound(message),
            (Call::Start, 304) => ContainerError::AlreadyRunning(message),
            (Call::Stop, 304) => ContainerError::NotRunning(message),
            // Host port conflicts are 500s on start; the message is the only signal.
            _ => ContainerError::Runtime(e.to_string()),
        }
    }
}

fn network_create_error(e: bollard::errors::Error, name: &str) -> NetworkError {
    match engine_status(&e) {
        Some((409, _)) => NetworkError::AlreadyExists(name.to_string()),
        _ => NetworkError::Runtime(e.to_string()),
    }
}

fn credentials(auth: &RegistryAuth) -> DockerCredentials {
    DockerCredentials {
        auth: Some(auth.token.clone()),
        serveraddress: auth.server.clone(),
        ..Default::default()
    }
}

fn map_state(status: bollard::models::ContainerStateStatusEnum) -> ContainerState {
    use bollard::models::ContainerStateStatusEnum as S;
    match status {
        S::CREATED => ContainerState::Created,
        S::RUNNING => ContainerState::Running,
        S::PAUSED => ContainerState::Paused,
        S::RESTARTING => ContainerState::Restarting,
        S::REMOVING => ContainerState::Removing,
        S::EXITED => ContainerState::Exited,
        S::DEAD => ContainerState::Dead,
        _ => ContainerState::Exited,
    }
}

/// Runtime backed by the engine's HTTP API over a unix socket.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to the runtime found by `detect_local()`.
    pub fn connect(detected: &DetectedRuntime) -> Result<Self, RuntimeInfoError> {
        let client =
            Docker::connect_with_unix(&detected.socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(Self::new(client, detected.runtime_type))
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }
}

impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }

    async fn version(&self) -> Result<EngineVersion, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::Runtime(e.to_string()))?;

        Ok(EngineVersion {
            version: info.server_version.unwrap_or_default(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        // Progress stream; errors can arrive mid-pull.
        let mut stream = self
            .client
            .create_image(Some(opts), None, auth.map(credentials));
        while let Some(result) = stream.next().await {
            result.map_err(|e| image_pull_error(e, &image_name))?;
        }

        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        let image_name = reference.to_string();

        match self.client.inspect_image(&image_name).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(engine_status(&e), Some((404, _))) => Ok(false),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {}: {}",
                image_name, e
            ))),
        }
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let mut host_config = HostConfig::default();

        let mounts: Vec<Mount> = config
            .volumes
            .iter()
            .map(|m| Mount {
                source: Some(m.source.clone()),
                target: Some(m.target.clone()),
                typ: Some(MountTypeEnum::BIND),
                read_only: Some(m.read_only),
                ..Default::default()
            })
            .collect();
        if !mounts.is_empty() {
            host_config.mounts = Some(mounts);
        }

        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        let mut exposed_ports: Vec<String> = Vec::new();
        for port in &config.ports {
            let port_key = format!("{}/{}", port.container_port, port.protocol.as_str());
            exposed_ports.push(port_key.clone());

            if let Some(host_port) = port.host_port {
                port_bindings.insert(
                    port_key,
                    Some(vec![PortBinding {
                        host_ip: None,
                        host_port: Some(host_port.to_string()),
                    }]),
                );
            }
        }
        if !port_bindings.is_empty() {
            host_config.port_bindings = Some(port_bindings);
        }

        if let Some(ref network) = config.network {
            host_config.network_mode = Some(network.clone());
        }

        let container_config = ContainerCreateBody {
            image: Some(config.image.to_string()),
            env: if config.env.is_empty() {
                None
            } else {
                Some(config.env.clone())
            },
            labels: if config.labels.is_empty() {
                None
            } else {
                Some(config.labels.clone())
            },
            cmd: config.command.clone(),
            entrypoint: config.entrypoint.clone(),
            host_config: Some(host_config),
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: config.name.clone(),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), container_config)
            .await
            .map_err(container_error(Call::Create))?;

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(container_error(Call::Start))
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(container_error(Call::Stop))
    }

    async fn remove_container(
        &self,
        id: &ContainerId,
        force: bool,
        volumes: bool,
    ) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            v: volumes,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(container_error(Call::Lookup))
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(container_error(Call::Lookup))?;

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(map_state)
            .unwrap_or(ContainerState::Exited);

        let mut networks = HashMap::new();
        if let Some(ref network_settings) = details.network_settings
            && let Some(ref nets) = network_settings.networks
        {
            for (name, endpoint) in nets {
                networks.insert(
                    name.clone(),
                    NetworkInfo {
                        network_id: endpoint.network_id.clone().unwrap_or_default(),
                        ip_address: endpoint.ip_address.clone().unwrap_or_default(),
                    },
                );
            }
        }

        let mounts = details
            .mounts
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.destination)
            .collect();

        let (image, env, labels) = match details.config {
            Some(c) => (
                c.image.unwrap_or_default(),
                c.env.unwrap_or_default(),
                c.labels.unwrap_or_default(),
            ),
            None => Default::default(),
        };

        Ok(ContainerInfo {
            id: id.clone(),
            name: details
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image,
            state,
            args: details.args.unwrap_or_default(),
            env,
            mounts,
            labels,
            network_settings: NetworkSettings { networks },
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in &filters.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{}={}", key, value));
        }

        let opts = ListContainersOptions {
            all: filters.all,
            filters: Some(filter_map),
            ..Default::default()
        };

        let containers = self
            .client
            .list_containers(Some(opts))
            .await
            .map_err(|e| ContainerError::Runtime(e.to_string()))?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: ContainerId::new(c.id.unwrap_or_default()),
                image: c.image.unwrap_or_default(),
                state: c
                    .state
                    .map(|s| format!("{:?}", s).to_lowercase())
                    .unwrap_or_default(),
                labels: c.labels.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl NetworkOps for BollardRuntime {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        let request = bollard::models::NetworkCreateRequest {
            name: config.name.clone(),
            driver: config.driver.clone(),
            labels: if config.labels.is_empty() {
                None
            } else {
                Some(config.labels.clone())
            },
            ..Default::default()
        };

        let response = self
            .client
            .create_network(request)
            .await
            .map_err(|e| network_create_error(e, &config.name))?;

        Ok(NetworkId::new(response.id))
    }

    async fn inspect_network(&self, name: &str) -> Result<NetworkDetails, NetworkError> {
        let network = self
            .client
            .inspect_network(name, None::<InspectNetworkOptions>)
            .await
            .map_err(|e| match engine_status(&e) {
                Some((404, _)) => NetworkError::NotFound(name.to_string()),
                _ => NetworkError::Runtime(e.to_string()),
            })?;

        Ok(NetworkDetails {
            id: network.id.unwrap_or_default(),
            name: network.name.unwrap_or_else(|| name.to_string()),
            driver: network.driver.unwrap_or_default(),
        })
    }
}
