// ABOUTME: Image capability: presence check and pull.
// ABOUTME: Pulls carry registry credentials only when the caller supplies them.

use super::sealed::Sealed;
use super::shared_types::RegistryAuth;
use crate::types::ImageRef;
use async_trait::async_trait;

#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError>;

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image does not exist in its registry: {0}")]
    NotFound(String),

    /// Raised before any pull when a private image has no token configured.
    #[error("registry refused credentials: {0}")]
    AuthenticationFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("{0}")]
    Runtime(String),
}
