// ABOUTME: Generic service lifecycle engine parameterized by a workload profile.
// ABOUTME: Options merging, port allocation, error classification and the retrying start.

pub mod classify;
mod error;
mod kind;
mod lifecycle;
mod options;
mod ports;
mod profile;

pub use error::ServiceError;
pub use kind::ServiceKind;
pub use lifecycle::{Service, ServiceCore, ServiceState};
pub use options::{
    ContainerSpec, MANAGED_LABEL, NetworkSpec, RenderFn, SERVICE_LABEL, ServiceOptions,
    ServiceOverrides, Settings,
};
pub use ports::{PortRange, PortSlot, PortTable};
pub use profile::{CleanStrategy, ServiceProfile};
