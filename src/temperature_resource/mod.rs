//! Temperature sensor resource (`oic.r.temperature`), the slow-GET example.

pub mod entity;
pub mod error;

pub use entity::{Temperature, TemperatureCreate};
pub use error::TemperatureError;

use crate::config::ServerConfig;
use crate::platform::ResourcePlatform;
use crate::server::{ResourceObject, ResourceResult};
use std::sync::Arc;

pub fn new(
    uri: &str,
    params: TemperatureCreate,
    config: &ServerConfig,
    platform: Arc<dyn ResourcePlatform>,
) -> ResourceResult<ResourceObject<Temperature>> {
    ResourceObject::<Temperature>::builder(uri, params)
        .config(config.clone())
        .build(platform)
}
