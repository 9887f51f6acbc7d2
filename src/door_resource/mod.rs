//! Door resource (`core.door`).

pub mod entity;
pub mod error;

pub use entity::{Door, DoorCreate};
pub use error::DoorError;

use crate::config::ServerConfig;
use crate::platform::ResourcePlatform;
use crate::server::{ResourceObject, ResourceResult};
use std::sync::Arc;

/// Creates a door on `side` at `uri` and registers it.
pub fn new(
    uri: &str,
    side: &str,
    config: &ServerConfig,
    platform: Arc<dyn ResourcePlatform>,
) -> ResourceResult<ResourceObject<Door>> {
    ResourceObject::<Door>::builder(uri, DoorCreate::new(side))
        .config(config.clone())
        .build(platform)
}
