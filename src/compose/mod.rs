// ABOUTME: Multi-service topologies: the drive stack and the full gateway stack.
// ABOUTME: Tiers start in dependency order with runtime addresses wired through env vars.

mod drive;
mod full_stack;
mod host_alias;
mod teardown;
mod wiring;

pub use drive::{DriveOverrides, DriveStack};
pub use full_stack::{FullStack, FullStackOverrides};
pub use host_alias::{HostAliasPolicy, MAC_HOST_ALIAS};
pub use wiring::{INSIGHT_CONFIG_ENV, dapi_envs, drive_envs, insight_config, merge_json};

use crate::service::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("only one full stack instance is supported, {0} requested")]
    MultipleInstancesUnsupported(usize),

    /// Some members of a tier could not be removed; the rest were.
    #[error("removing {tier} tier failed: {}", describe(.failures))]
    Teardown {
        tier: &'static str,
        failures: Vec<ServiceError>,
    },
}

fn describe(failures: &[ServiceError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
