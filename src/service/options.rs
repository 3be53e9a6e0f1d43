// ABOUTME: Service options: defaults merged with overrides, plus the rendered container spec.
// ABOUTME: ServiceOptions is an immutable snapshot; regenerating ports yields a new value.

use super::kind::ServiceKind;
use super::ports::{PortSlot, PortTable};
use crate::runtime::{ContainerConfig, PortMapping, Protocol, VolumeMount};
use crate::types::ImageRef;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Free-form per-service settings such as RPC credentials.
pub type Settings = BTreeMap<String, String>;

/// Renders a container spec from allocated ports and settings.
pub type RenderFn = fn(&PortTable, &Settings) -> ContainerSpec;

pub const MANAGED_LABEL: &str = "dockyard.managed";
pub const SERVICE_LABEL: &str = "dockyard.service";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSpec {
    pub name: String,
    pub driver: String,
}

/// Caller- or config-supplied changes to a service's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceOverrides {
    pub image: Option<ImageRef>,
    pub network: Option<String>,
    pub network_driver: Option<String>,
    /// `KEY=VALUE`; merged into the defaults by key.
    pub envs: Vec<String>,
    /// `host:container[:ro]`; appended to the defaults.
    pub volumes: Vec<String>,
    pub cmd: Option<Vec<String>>,
    pub entrypoint: Option<Vec<String>>,
    /// `host:container` mappings; replace the rendered list wholesale.
    pub publish: Option<Vec<String>>,
    /// Initial values for logical ports; redrawn after a conflict.
    pub ports: BTreeMap<String, u16>,
    /// Logical ports that keep their value across regeneration.
    pub pinned_ports: BTreeMap<String, u16>,
    pub settings: Settings,
}

impl ServiceOverrides {
    /// `self` with `over` applied on top.
    pub fn layered(&self, over: &ServiceOverrides) -> ServiceOverrides {
        let mut merged = self.clone();
        if over.image.is_some() {
            merged.image = over.image.clone();
        }
        if over.network.is_some() {
            merged.network = over.network.clone();
        }
        if over.network_driver.is_some() {
            merged.network_driver = over.network_driver.clone();
        }
        for entry in &over.envs {
            merge_env(&mut merged.envs, entry);
        }
        merged.volumes.extend(over.volumes.iter().cloned());
        if over.cmd.is_some() {
            merged.cmd = over.cmd.clone();
        }
        if over.entrypoint.is_some() {
            merged.entrypoint = over.entrypoint.clone();
        }
        if over.publish.is_some() {
            merged.publish = over.publish.clone();
        }
        merged.ports.extend(over.ports.clone());
        merged.pinned_ports.extend(over.pinned_ports.clone());
        merged.settings.extend(over.settings.clone());
        merged
    }

    pub fn image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    pub fn network(mut self, name: impl Into<String>) -> Self {
        self.network = Some(name.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        merge_env(&mut self.envs, &format!("{}={}", key, value));
        self
    }

    pub fn envs<I: IntoIterator<Item = String>>(mut self, entries: I) -> Self {
        for entry in entries {
            merge_env(&mut self.envs, &entry);
        }
        self
    }

    pub fn volume(mut self, volume: impl Into<String>) -> Self {
        self.volumes.push(volume.into());
        self
    }

    pub fn cmd<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn port(mut self, name: &str, port: u16) -> Self {
        self.ports.insert(name.to_string(), port);
        self
    }

    pub fn pin_port(mut self, name: &str, port: u16) -> Self {
        self.pinned_ports.insert(name.to_string(), port);
        self
    }

    pub fn setting(mut self, key: &str, value: impl Into<String>) -> Self {
        self.settings.insert(key.to_string(), value.into());
        self
    }
}

/// Everything needed to create one container, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub network: NetworkSpec,
    pub publish: Vec<String>,
    pub cmd: Option<Vec<String>>,
    pub entrypoint: Option<Vec<String>>,
    pub envs: Vec<String>,
    pub volumes: Vec<String>,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            network: NetworkSpec {
                name: String::new(),
                driver: String::new(),
            },
            publish: Vec::new(),
            cmd: None,
            entrypoint: None,
            envs: Vec::new(),
            volumes: Vec::new(),
        }
    }

    pub fn publish(mut self, host: u16, container: u16) -> Self {
        self.publish.push(format!("{}:{}", host, container));
        self
    }

    pub fn cmd<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn entrypoint<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn env(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        merge_env(&mut self.envs, &format!("{}={}", key, value));
        self
    }

    /// Value of an environment entry, if set.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|e| env_key(e) == key)
            .and_then(|e| e.split_once('=').map(|(_, v)| v))
    }

    pub fn with_overrides(mut self, overrides: &ServiceOverrides) -> Self {
        if let Some(image) = &overrides.image {
            self.image = image.to_string();
        }
        if let Some(name) = &overrides.network {
            self.network.name = name.clone();
        }
        if let Some(driver) = &overrides.network_driver {
            self.network.driver = driver.clone();
        }
        for entry in &overrides.envs {
            merge_env(&mut self.envs, entry);
        }
        self.volumes.extend(overrides.volumes.iter().cloned());
        if let Some(cmd) = &overrides.cmd {
            self.cmd = Some(cmd.clone());
        }
        if let Some(entrypoint) = &overrides.entrypoint {
            self.entrypoint = Some(entrypoint.clone());
        }
        if let Some(publish) = &overrides.publish {
            self.publish = publish.clone();
        }
        self
    }

    /// Validate and convert into the runtime's create request.
    pub fn to_container_config(&self, kind: ServiceKind) -> Result<ContainerConfig, String> {
        let image = ImageRef::parse(&self.image).map_err(|e| e.to_string())?;
        let ports = self
            .publish
            .iter()
            .map(|p| parse_publish(p))
            .collect::<Result<Vec<_>, _>>()?;
        let volumes = self
            .volumes
            .iter()
            .map(|v| parse_volume(v))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(bad) = self.envs.iter().find(|e| !e.contains('=')) {
            return Err(format!("environment entry without '=': {}", bad));
        }

        let labels = HashMap::from([
            (MANAGED_LABEL.to_string(), "true".to_string()),
            (SERVICE_LABEL.to_string(), kind.to_string()),
        ]);

        Ok(ContainerConfig {
            name: None,
            image,
            env: self.envs.clone(),
            labels,
            ports,
            volumes,
            command: self.cmd.clone(),
            entrypoint: self.entrypoint.clone(),
            network: (!self.network.name.is_empty()).then(|| self.network.name.clone()),
        })
    }
}

/// Merged options for one service instance.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    kind: ServiceKind,
    layout: &'static [PortSlot],
    ports: PortTable,
    settings: Settings,
    network: NetworkSpec,
    overrides: ServiceOverrides,
    render: RenderFn,
}

impl ServiceOptions {
    pub fn new(
        kind: ServiceKind,
        layout: &'static [PortSlot],
        defaults: Settings,
        render: RenderFn,
        network: NetworkSpec,
        overrides: ServiceOverrides,
    ) -> Self {
        let mut settings = defaults;
        settings.extend(overrides.settings.clone());

        let mut preferred = overrides.ports.clone();
        preferred.extend(overrides.pinned_ports.clone());
        let ports = PortTable::allocate(layout, &preferred);

        Self {
            kind,
            layout,
            ports,
            settings,
            network,
            overrides,
            render,
        }
    }

    /// A copy with every non-pinned port redrawn from its range.
    pub fn regenerate_ports(&self) -> Self {
        Self {
            ports: PortTable::allocate(self.layout, &self.overrides.pinned_ports),
            ..self.clone()
        }
    }

    pub fn container_spec(&self) -> ContainerSpec {
        let mut spec = (self.render)(&self.ports, &self.settings);
        spec.network = self.network.clone();
        spec.with_overrides(&self.overrides)
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn ports(&self) -> &PortTable {
        &self.ports
    }

    pub fn port(&self, name: &str) -> u16 {
        self.ports.port(name)
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn network_name(&self) -> &str {
        self.overrides
            .network
            .as_deref()
            .unwrap_or(&self.network.name)
    }

    pub fn overrides(&self) -> &ServiceOverrides {
        &self.overrides
    }
}

fn env_key(entry: &str) -> &str {
    entry.split_once('=').map(|(k, _)| k).unwrap_or(entry)
}

/// Replace the entry with the same key in place, or append.
fn merge_env(envs: &mut Vec<String>, entry: &str) {
    let key = env_key(entry);
    match envs.iter_mut().find(|e| env_key(e) == key) {
        Some(existing) => *existing = entry.to_string(),
        None => envs.push(entry.to_string()),
    }
}

fn parse_publish(raw: &str) -> Result<PortMapping, String> {
    let (ports, protocol) = match raw.rsplit_once('/') {
        Some((ports, "tcp")) => (ports, Protocol::Tcp),
        Some((ports, "udp")) => (ports, Protocol::Udp),
        Some((_, other)) => return Err(format!("unknown protocol {:?} in {}", other, raw)),
        None => (raw, Protocol::Tcp),
    };
    let parse = |s: &str| {
        s.parse::<u16>()
            .map_err(|_| format!("invalid port mapping: {}", raw))
    };
    match ports.split_once(':') {
        Some((host, container)) => Ok(PortMapping {
            host_port: Some(parse(host)?),
            container_port: parse(container)?,
            protocol,
        }),
        None => Ok(PortMapping {
            host_port: None,
            container_port: parse(ports)?,
            protocol,
        }),
    }
}

fn parse_volume(raw: &str) -> Result<VolumeMount, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (source, target, read_only) = match parts.as_slice() {
        [source, target] => (*source, *target, false),
        [source, target, "ro"] => (*source, *target, true),
        [source, target, "rw"] => (*source, *target, false),
        _ => return Err(format!("invalid volume: {}", raw)),
    };
    if source.is_empty() || !target.starts_with('/') {
        return Err(format!("invalid volume: {}", raw));
    }
    Ok(VolumeMount {
        source: source.to_string(),
        target: target.to_string(),
        read_only,
    })
}
