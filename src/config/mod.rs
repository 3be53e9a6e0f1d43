// ABOUTME: Fleet configuration loaded from dockyard.yml or built in code.
// ABOUTME: Per-kind option overrides, retry bounds, host alias and registry settings.

mod registry;
mod retry;

pub use registry::PrivateRegistry;
pub use retry::{ReadinessPolicy, RetryPolicy};

use crate::compose::HostAliasPolicy;
use crate::error::{Error, Result};
use crate::runtime::RuntimeConfig;
use crate::service::{ServiceKind, ServiceOverrides};
use crate::types::ImageRef;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "dockyard.yml";
pub const CONFIG_FILENAME_ALT: &str = "dockyard.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".dockyard/config.yml";

/// Image overrides read from the environment, and the kinds they apply to.
const IMAGE_ENV_OVERRIDES: &[(&str, &[ServiceKind])] = &[
    (
        "SERVICE_IMAGE_DRIVE",
        &[ServiceKind::DriveApi, ServiceKind::DriveSync],
    ),
    ("SERVICE_IMAGE_CORE", &[ServiceKind::ChainNode]),
    (
        "SERVICE_IMAGE_DAPI",
        &[ServiceKind::DapiCore, ServiceKind::TxFilterStream],
    ),
    ("SERVICE_IMAGE_INSIGHT", &[ServiceKind::Insight]),
];

/// Settings shared by every service a [`Fleet`](crate::Fleet) creates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Explicit runtime socket; auto-detected when absent.
    pub runtime: Option<RuntimeConfig>,

    pub network: NetworkDefaults,

    /// Host the orchestrating process uses to reach published RPC ports.
    pub rpc_host: String,

    pub retry: RetryPolicy,

    pub readiness: ReadinessPolicy,

    /// Pause after peering chain nodes so the first block propagates.
    #[serde(with = "humantime_serde")]
    pub propagation_wait: Duration,

    pub host_alias: HostAliasPolicy,

    pub private_registry: PrivateRegistry,

    /// Per-kind overrides layered between built-in defaults and caller options.
    pub services: HashMap<ServiceKind, ServiceOverrides>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            runtime: None,
            network: NetworkDefaults::default(),
            rpc_host: "127.0.0.1".to_string(),
            retry: RetryPolicy::default(),
            readiness: ReadinessPolicy::default(),
            propagation_wait: Duration::from_secs(2),
            host_alias: HostAliasPolicy::default(),
            private_registry: PrivateRegistry::default(),
            services: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkDefaults {
    pub name: String,
    pub driver: String,
}

impl Default for NetworkDefaults {
    fn default() -> Self {
        Self {
            name: "axe_test_network".to_string(),
            driver: "bridge".to_string(),
        }
    }
}

impl FleetConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`discover`](Self::discover), but falls back to defaults when no
    /// file exists.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply `SERVICE_IMAGE_*` variables on top of the configured images.
    pub fn with_env_image_overrides(mut self) -> Result<Self> {
        for (var, kinds) in IMAGE_ENV_OVERRIDES {
            let Ok(value) = std::env::var(var) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            let image = ImageRef::parse(&value)
                .map_err(|e| Error::InvalidConfig(format!("{}: {}", var, e)))?;
            for kind in kinds.iter() {
                self.services.entry(*kind).or_default().image = Some(image.clone());
            }
            tracing::debug!(variable = var, image = %image, "image override from environment");
        }
        Ok(self)
    }

    /// Configured overrides for one kind (empty when none).
    pub fn overrides_for(&self, kind: ServiceKind) -> ServiceOverrides {
        self.services.get(&kind).cloned().unwrap_or_default()
    }

    pub fn with_overrides(mut self, kind: ServiceKind, overrides: ServiceOverrides) -> Self {
        self.services.insert(kind, overrides);
        self
    }
}
