// ABOUTME: Local container runtime detection.
// ABOUTME: Honors DOCKER_HOST and explicit config, then probes Docker and Podman sockets.

use super::types::{DetectedRuntime, RuntimeConfig, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked DOCKER_HOST, Docker and Podman sockets)")]
    NoRuntimeFound,

    #[error("unsupported DOCKER_HOST (only unix:// sockets are supported): {0}")]
    UnsupportedHost(String),
}

const DOCKER_SOCKET: &str = "/var/run/docker.sock";
const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";

/// Detect the container runtime on this host.
///
/// Detection order:
/// 1. Explicit `config` (runtime type and/or socket)
/// 2. `DOCKER_HOST` when it points at a unix socket
/// 3. Docker socket (`/var/run/docker.sock`)
/// 4. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 5. Rootful Podman socket (`/run/podman/podman.sock`)
///
/// Docker is probed before Podman: fixture images are published for Docker
/// and Podman is only used through its Docker-compatible API.
pub fn detect_local(config: Option<&RuntimeConfig>) -> Result<DetectedRuntime, DetectionError> {
    if let Some(cfg) = config {
        match (cfg.runtime, cfg.socket.as_ref()) {
            (runtime, Some(socket)) => {
                return Ok(DetectedRuntime {
                    runtime_type: runtime.unwrap_or(RuntimeType::Docker),
                    socket_path: socket.clone(),
                });
            }
            (Some(runtime_type), None) => {
                return Ok(DetectedRuntime {
                    runtime_type,
                    socket_path: default_socket_path(runtime_type),
                });
            }
            (None, None) => {}
        }
    }

    if let Ok(host) = std::env::var("DOCKER_HOST")
        && !host.is_empty()
    {
        let socket = host
            .strip_prefix("unix://")
            .ok_or_else(|| DetectionError::UnsupportedHost(host.clone()))?;
        return Ok(DetectedRuntime {
            runtime_type: RuntimeType::Docker,
            socket_path: socket.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(DetectedRuntime {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(DetectedRuntime {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(DetectedRuntime {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        // Fall back to reading /proc/self/status
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(runtime: RuntimeType) -> String {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET.to_string(),
        RuntimeType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}
