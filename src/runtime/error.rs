// ABOUTME: Why a fleet could not get hold of a container engine.
// ABOUTME: Snafu enum over detection and connection failures, plus a flat kind.

use snafu::Snafu;

use super::detection::DetectionError;
use super::traits::RuntimeInfoError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("no usable container engine: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("container engine did not answer: {source}"))]
    Connection { source: RuntimeInfoError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    NoRuntimeFound,
    /// DOCKER_HOST is set to something other than a unix socket.
    UnsupportedHost,
    ConnectionFailed,
    /// The engine answered the ping but failed to describe itself.
    RuntimeOperation,
}

impl RuntimeError {
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection {
                source: DetectionError::NoRuntimeFound,
            } => RuntimeErrorKind::NoRuntimeFound,
            RuntimeError::Detection {
                source: DetectionError::UnsupportedHost(_),
            } => RuntimeErrorKind::UnsupportedHost,
            RuntimeError::Connection {
                source: RuntimeInfoError::ConnectionFailed(_),
            } => RuntimeErrorKind::ConnectionFailed,
            RuntimeError::Connection {
                source: RuntimeInfoError::Runtime(_),
            } => RuntimeErrorKind::RuntimeOperation,
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

impl From<RuntimeInfoError> for RuntimeError {
    fn from(source: RuntimeInfoError) -> Self {
        RuntimeError::Connection { source }
    }
}
