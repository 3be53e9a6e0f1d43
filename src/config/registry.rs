// ABOUTME: Private registry settings for authenticated image pulls.
// ABOUTME: Matches image registries against a host pattern and reads the token from the environment.

use crate::runtime::RegistryAuth;
use crate::types::ImageRef;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrivateRegistry {
    /// Substring of the registry host that marks an image as private.
    pub pattern: String,
    /// Environment variable holding the base64 registry token.
    pub token_env: String,
}

impl Default for PrivateRegistry {
    fn default() -> Self {
        Self {
            pattern: "amazonaws.com".to_string(),
            token_env: "DOCKER_REGISTRY_TOKEN".to_string(),
        }
    }
}

impl PrivateRegistry {
    pub fn requires_auth(&self, image: &ImageRef) -> bool {
        image.matches_registry(&self.pattern)
    }

    /// Credentials for pulling `image`.
    ///
    /// `Ok(None)` for public images, `Err(var)` when the image is private
    /// but the token variable is unset or empty.
    pub fn auth_for(&self, image: &ImageRef) -> Result<Option<RegistryAuth>, String> {
        if !self.requires_auth(image) {
            return Ok(None);
        }
        match std::env::var(&self.token_env) {
            Ok(token) if !token.is_empty() => Ok(Some(RegistryAuth {
                token,
                server: image.registry().map(|r| format!("https://{}", r)),
            })),
            _ => Err(self.token_env.clone()),
        }
    }
}
