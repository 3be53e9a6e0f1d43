// ABOUTME: Container runtime abstraction for Docker and Podman.
// ABOUTME: Detection, the bollard-backed engine and the capability traits.

mod detection;
mod engine;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod traits;
mod types;

pub use detection::{DetectionError, detect_local};
pub use engine::BollardRuntime;
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps,
    ContainerState, ContainerSummary, EngineVersion, FullRuntime, ImageError, ImageOps,
    NetworkConfig, NetworkDetails, NetworkError, NetworkOps, PortMapping, Protocol, RegistryAuth,
    RuntimeInfo, RuntimeInfoError, SharedRuntime, VolumeMount,
};
pub use types::{DetectedRuntime, RuntimeConfig, RuntimeType};

use std::sync::Arc;

/// Detect the local runtime, connect to it and verify it answers.
pub async fn connect_local(config: Option<&RuntimeConfig>) -> Result<SharedRuntime, RuntimeError> {
    let detected = detect_local(config)?;
    tracing::debug!(
        runtime = %detected.runtime_type,
        socket = %detected.socket_path,
        "connecting to container runtime"
    );
    let runtime = BollardRuntime::connect(&detected)?;
    runtime.ping().await?;
    let engine = runtime.version().await?;
    tracing::info!(
        runtime = %detected.runtime_type,
        version = %engine.version,
        os = %engine.os,
        arch = %engine.arch,
        "container runtime ready"
    );
    Ok(Arc::new(runtime))
}
