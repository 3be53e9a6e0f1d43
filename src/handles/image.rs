// ABOUTME: Ensures a service image is present locally.
// ABOUTME: Pulls only when missing, with a registry token for private registries.

use crate::config::PrivateRegistry;
use crate::runtime::{ImageError, SharedRuntime};
use crate::types::ImageRef;

pub struct ImageHandle {
    runtime: SharedRuntime,
    image: ImageRef,
    registry: PrivateRegistry,
}

impl ImageHandle {
    pub fn new(runtime: SharedRuntime, image: ImageRef, registry: PrivateRegistry) -> Self {
        Self {
            runtime,
            image,
            registry,
        }
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub async fn ensure(&self) -> Result<(), ImageError> {
        if self.runtime.image_exists(&self.image).await? {
            return Ok(());
        }

        let auth = self.registry.auth_for(&self.image).map_err(|var| {
            ImageError::AuthenticationFailed(format!(
                "{}: registry token variable {} is not set",
                self.image, var
            ))
        })?;

        tracing::info!(image = %self.image, authenticated = auth.is_some(), "pulling image");
        self.runtime.pull_image(&self.image, auth.as_ref()).await
    }
}
