//! Light resource (`core.light`).

pub mod entity;
pub mod error;

pub use entity::{Light, LightCreate};
pub use error::LightError;

use crate::config::ServerConfig;
use crate::platform::ResourcePlatform;
use crate::server::{ResourceObject, ResourceResult};
use std::sync::Arc;

/// Creates a light at `uri` and registers it.
pub fn new(
    uri: &str,
    params: LightCreate,
    config: &ServerConfig,
    platform: Arc<dyn ResourcePlatform>,
) -> ResourceResult<ResourceObject<Light>> {
    ResourceObject::<Light>::builder(uri, params)
        .config(config.clone())
        .build(platform)
}
