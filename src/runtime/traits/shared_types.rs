// ABOUTME: Plain data passed across the runtime traits.
// ABOUTME: What a fixture asks the engine for, and what the engine reports back.

use crate::types::{ContainerId, ImageRef};
use std::collections::HashMap;

/// Everything needed to create one fixture container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Engine-generated when `None`.
    pub name: Option<String>,
    pub image: ImageRef,
    /// `KEY=VALUE`, in order; later entries win inside the engine.
    pub env: Vec<String>,
    pub labels: HashMap<String, String>,
    pub ports: Vec<PortMapping>,
    pub volumes: Vec<VolumeMount>,
    /// Replaces the image CMD.
    pub command: Option<Vec<String>>,
    /// Replaces the image ENTRYPOINT.
    pub entrypoint: Option<Vec<String>>,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    /// `None` exposes the port on the container network only.
    pub host_port: Option<u16>,
    pub container_port: u16,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// A bind mount or named volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

/// Engine view of a container, refreshed after every start.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    /// Command arguments after the executable.
    pub args: Vec<String>,
    pub env: Vec<String>,
    /// Destinations inside the container.
    pub mounts: Vec<String>,
    pub labels: HashMap<String, String>,
    pub network_settings: NetworkSettings,
}

impl ContainerInfo {
    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }

    /// Address other fixtures on `network` reach this container at.
    ///
    /// `None` until the engine has assigned one.
    pub fn ip_on(&self, network: &str) -> Option<&str> {
        self.network_settings
            .networks
            .get(network)
            .map(|n| n.ip_address.as_str())
            .filter(|ip| !ip.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkSettings {
    /// Keyed by network name.
    pub networks: HashMap<String, NetworkInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkInfo {
    pub network_id: String,
    pub ip_address: String,
}

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub name: String,
    /// Engine default (bridge) when `None`.
    pub driver: Option<String>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct NetworkDetails {
    pub id: String,
    pub name: String,
    pub driver: String,
}

/// Pull credentials for a private registry.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    /// Base64 `user:password`, as cloud registries issue it.
    pub token: String,
    /// Registry address, e.g. `https://123.dkr.ecr.us-west-2.amazonaws.com`.
    pub server: Option<String>,
}

/// What the engine reports about itself when a fleet connects.
#[derive(Debug, Clone)]
pub struct EngineVersion {
    pub version: String,
    pub os: String,
    pub arch: String,
}
