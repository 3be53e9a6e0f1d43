// ABOUTME: Idempotent creation of the network a service attaches to.
// ABOUTME: "Already exists" from the engine counts as success, since services race to create it.

use crate::runtime::{NetworkConfig, NetworkError, SharedRuntime};
use std::collections::HashMap;

pub struct NetworkHandle {
    runtime: SharedRuntime,
    config: NetworkConfig,
}

impl NetworkHandle {
    pub fn new(runtime: SharedRuntime, name: &str, driver: &str) -> Self {
        Self {
            runtime,
            config: NetworkConfig {
                name: name.to_string(),
                driver: Some(driver.to_string()),
                labels: HashMap::from([(
                    crate::service::MANAGED_LABEL.to_string(),
                    "true".to_string(),
                )]),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Make sure the network exists; safe to call concurrently.
    pub async fn ensure(&self) -> Result<(), NetworkError> {
        match self.runtime.inspect_network(&self.config.name).await {
            Ok(details) => {
                if let Some(driver) = &self.config.driver
                    && !details.driver.is_empty()
                    && &details.driver != driver
                {
                    tracing::warn!(
                        network = %self.config.name,
                        expected = %driver,
                        actual = %details.driver,
                        "network exists with a different driver"
                    );
                }
                return Ok(());
            }
            Err(NetworkError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        match self.runtime.create_network(&self.config).await {
            Ok(id) => {
                tracing::debug!(network = %self.config.name, id = %id.short(), "created network");
                Ok(())
            }
            Err(NetworkError::AlreadyExists(_)) => {
                tracing::debug!(network = %self.config.name, "network created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
