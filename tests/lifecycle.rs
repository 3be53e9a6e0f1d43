// ABOUTME: Integration tests for the service lifecycle against a real local runtime.
// ABOUTME: Uses a small sleeping image in place of the heavy workload images.

mod support;

use dockyard::config::{FleetConfig, NetworkDefaults};
use dockyard::service::{Service, ServiceError, ServiceOverrides, ServiceState};
use dockyard::services::DocumentStore;

fn sleeper() -> ServiceOverrides {
    ServiceOverrides::default()
        .image("alpine:3.19".parse().unwrap())
        .cmd(["sleep", "300"])
}

fn isolated_config() -> FleetConfig {
    FleetConfig {
        network: NetworkDefaults {
            name: support::unique("dockyard_test"),
            driver: "bridge".to_string(),
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn service_lifecycle() {
    let Some(fleet) = support::local_fleet(isolated_config()).await else {
        return;
    };
    let mut service = fleet.create::<DocumentStore>(&sleeper()).unwrap();
    assert!(!service.is_initialized());

    service.start().await.expect("start should succeed");
    assert!(service.is_initialized());
    assert_eq!(service.state(), ServiceState::Running);
    assert!(!service.ip().unwrap().is_empty());

    let info = service.inspect().await.unwrap();
    assert!(info.is_running());
    assert!(info.image.contains("alpine"));
    assert_eq!(
        info.labels.get("dockyard.managed").map(String::as_str),
        Some("true")
    );

    service.stop().await.expect("stop should succeed");
    assert!(!service.inspect().await.unwrap().is_running());

    service.remove().await.expect("remove should succeed");
    assert!(!service.is_initialized());
    assert!(matches!(
        service.ip(),
        Err(ServiceError::NotInitialized { .. })
    ));
}

#[tokio::test]
async fn same_port_services_both_start() {
    let Some(fleet) = support::local_fleet(isolated_config()).await else {
        return;
    };
    let overrides = sleeper().port("mongo", 27444);
    let mut a: Service<DocumentStore> = fleet.create(&overrides).unwrap();
    let mut b: Service<DocumentStore> = fleet.create(&overrides).unwrap();

    let (ra, rb) = tokio::join!(a.start(), b.start());
    let outcome = ra.and(rb);

    let ports = (a.host_port(), b.host_port());
    let attempts = a.start_attempts() + b.start_attempts();
    a.remove().await.unwrap();
    b.remove().await.unwrap();

    outcome.expect("both services should start");
    assert_ne!(ports.0, ports.1);
    assert!(attempts > 2, "one start should have been retried");
}

#[tokio::test]
async fn shared_network_is_created_once() {
    let Some(fleet) = support::local_fleet(isolated_config()).await else {
        return;
    };
    let mut services = Vec::new();
    for _ in 0..3 {
        services.push(fleet.create::<DocumentStore>(&sleeper()).unwrap());
    }

    let results = futures::future::join_all(services.iter_mut().map(|s| s.start())).await;

    for service in &mut services {
        service.remove().await.unwrap();
    }
    for result in results {
        result.expect("no start should fail on network creation");
    }
}
