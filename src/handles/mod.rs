// ABOUTME: Thin handles over runtime resources owned by one service.
// ABOUTME: Network and image handles are idempotent; the container handle tracks one container.

mod container;
mod image;
mod network;

pub use container::ContainerHandle;
pub use image::ImageHandle;
pub use network::NetworkHandle;
