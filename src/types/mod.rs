// ABOUTME: Typed identifiers and image references shared across the crate.
// ABOUTME: Phantom-typed IDs keep container and network handles from being mixed up.

mod id;
mod image_ref;

pub use id::{ContainerId, NetworkId};
pub use image_ref::{ImageRef, ParseImageRefError};
