// ABOUTME: Test support utilities.
// ABOUTME: Tracing setup and access to the local container runtime.

use dockyard::Fleet;
use dockyard::config::FleetConfig;
use dockyard::runtime::RuntimeErrorKind;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("dockyard=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Fleet on the local Docker or Podman socket, or `None` when there is
/// none; callers return early so the suite passes on machines without one.
#[allow(dead_code)]
pub async fn local_fleet(config: FleetConfig) -> Option<Fleet> {
    init_tracing();
    match Fleet::connect_local(config).await {
        Ok(fleet) => Some(fleet),
        Err(e) if e.kind() == RuntimeErrorKind::RuntimeOperation => {
            panic!("container runtime is reachable but unhealthy: {e}")
        }
        Err(e) => {
            eprintln!("skipping: no container runtime available ({e})");
            None
        }
    }
}

/// Name unique to this test process.
#[allow(dead_code)]
pub fn unique(prefix: &str) -> String {
    format!("{}_{}_{}", prefix, std::process::id(), rand::random::<u32>())
}
