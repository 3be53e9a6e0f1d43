// ABOUTME: Which engine fixtures run on and where its socket lives.
// ABOUTME: Read from the `runtime:` section of the fleet config or detected.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    /// Driven through its Docker-compatible API.
    Podman,
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeType::Docker => "docker",
            RuntimeType::Podman => "podman",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedRuntime {
    pub runtime_type: RuntimeType,
    pub socket_path: String,
}

/// Pins the engine instead of probing for one.
///
/// ```yaml
/// runtime:
///   runtime: podman
///   socket: /run/user/1000/podman/podman.sock
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    pub runtime: Option<RuntimeType>,
    /// Socket path; with no `runtime` the engine is assumed to be Docker.
    pub socket: Option<String>,
}
