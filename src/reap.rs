// ABOUTME: Removes every container this crate created, running or not.
// ABOUTME: Selects containers by the managed label, so unrelated containers are never touched.

use crate::error::{Error, Result};
use crate::runtime::{ContainerError, ContainerFilters, SharedRuntime};
use crate::service::MANAGED_LABEL;
use std::collections::HashMap;

/// Force-remove all managed containers; returns how many were removed.
pub async fn reap(runtime: &SharedRuntime) -> Result<usize> {
    let filters = ContainerFilters {
        labels: HashMap::from([(MANAGED_LABEL.to_string(), "true".to_string())]),
        all: true,
    };
    let containers = runtime
        .list_containers(&filters)
        .await
        .map_err(|source| Error::Reap {
            id: "*".to_string(),
            source,
        })?;

    let mut removed = 0;
    for container in containers {
        match runtime.remove_container(&container.id, true, true).await {
            Ok(()) => removed += 1,
            Err(ContainerError::NotFound(_)) => {}
            Err(source) => {
                return Err(Error::Reap {
                    id: container.id.to_string(),
                    source,
                });
            }
        }
        tracing::debug!(container = %container.id.short(), image = %container.image, "reaped");
    }

    tracing::info!(removed, "reaped managed containers");
    Ok(removed)
}
