// ABOUTME: Composable capability traits for the container runtime.
// ABOUTME: Defines ImageOps, ContainerOps, NetworkOps, RuntimeInfo and FullRuntime.

mod container;
mod image;
mod network;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use image::{ImageError, ImageOps};
pub use network::{NetworkError, NetworkOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

use std::sync::Arc;

/// Everything a managed service needs from the runtime.
///
/// Blanket-implemented, so any runtime with the three capabilities can be
/// shared across services as `Arc<dyn FullRuntime>`.
pub trait FullRuntime: ImageOps + ContainerOps + NetworkOps {}

impl<T: ImageOps + ContainerOps + NetworkOps> FullRuntime for T {}

/// Runtime handle shared by every service of a fleet.
pub type SharedRuntime = Arc<dyn FullRuntime>;
