//! Device information resource (`oic.wk.d`). Discoverable, not observable.

pub mod entity;
pub mod error;

pub use entity::{DeviceCreate, DeviceInfo};
pub use error::DeviceError;

use crate::config::ServerConfig;
use crate::platform::{ResourcePlatform, ResourceProperties};
use crate::server::{ResourceObject, ResourceResult};
use std::sync::Arc;

/// Well-known device URI.
pub const DEVICE_URI: &str = "/oic/d";

pub fn new(
    params: DeviceCreate,
    config: &ServerConfig,
    platform: Arc<dyn ResourcePlatform>,
) -> ResourceResult<ResourceObject<DeviceInfo>> {
    ResourceObject::<DeviceInfo>::builder(DEVICE_URI, params)
        .properties(ResourceProperties {
            discoverable: true,
            observable: false,
        })
        .config(config.clone())
        .build(platform)
}
