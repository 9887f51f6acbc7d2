use crate::config::HostConfig;
use crate::device_resource::{self, DeviceCreate, DeviceInfo};
use crate::door_resource::{self, Door};
use crate::light_resource::{self, Light, LightCreate};
use crate::platform::{InMemoryPlatform, RequestTransport, ResourcePlatform};
use crate::server::{ResourceObject, ResourceResult};
use crate::temperature_resource::{self, Temperature, TemperatureCreate};
use std::sync::Arc;
use tracing::{info, warn};

pub const LIGHT_URI: &str = "/a/light";
pub const LEFT_DOOR_URI: &str = "/a/door/left";
pub const RIGHT_DOOR_URI: &str = "/a/door/right";
pub const TEMPERATURE_URI: &str = "/a/temperature";

/// The sample server: one in-process platform hosting a light, two doors, a
/// temperature sensor and the device information resource.
///
/// ```ignore
/// let system = ServerSystem::start(&HostConfig::default())?;
/// let light = system.light.attributes().await?;
/// system.shutdown().await?;
/// ```
pub struct ServerSystem {
    platform: InMemoryPlatform,
    pub light: ResourceObject<Light>,
    pub left_door: ResourceObject<Door>,
    pub right_door: ResourceObject<Door>,
    pub temperature: ResourceObject<Temperature>,
    pub device: ResourceObject<DeviceInfo>,
}

impl ServerSystem {
    /// Registers every sample resource. Must run inside a tokio runtime.
    pub fn start(config: &HostConfig) -> ResourceResult<Self> {
        let platform = InMemoryPlatform::new(&config.platform);
        let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
        let server = &config.server;

        let light = light_resource::new(LIGHT_URI, LightCreate::default(), server, shared.clone())?;
        let left_door = door_resource::new(LEFT_DOOR_URI, "left", server, shared.clone())?;
        let right_door = door_resource::new(RIGHT_DOOR_URI, "right", server, shared.clone())?;
        let temperature = temperature_resource::new(
            TEMPERATURE_URI,
            TemperatureCreate::default(),
            server,
            shared.clone(),
        )?;
        let device = device_resource::new(
            DeviceCreate::new("oic-resource sample server", "sample-device-0001"),
            server,
            shared,
        )?;

        info!(resources = platform.resource_count(), "Server system started");
        Ok(Self {
            platform,
            light,
            left_door,
            right_door,
            temperature,
            device,
        })
    }

    pub fn platform(&self) -> &InMemoryPlatform {
        &self.platform
    }

    /// Client-side view of the same platform.
    pub fn transport(&self) -> Arc<dyn RequestTransport> {
        Arc::new(self.platform.clone())
    }

    /// Destroys every resource that is still alive. Resources already deleted
    /// by a client are skipped.
    pub async fn shutdown(self) -> ResourceResult<()> {
        info!("Shutting down server system...");
        let results = [
            destroy(&self.light).await,
            destroy(&self.left_door).await,
            destroy(&self.right_door).await,
            destroy(&self.temperature).await,
            destroy(&self.device).await,
        ];
        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "Resource teardown failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                info!(remaining = self.platform.resource_count(), "Server system shutdown complete.");
                Ok(())
            }
        }
    }
}

async fn destroy<T: crate::framework::ResourceEntity>(object: &ResourceObject<T>) -> ResourceResult<()> {
    if object.is_destroyed() {
        return Ok(());
    }
    object.destroy().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_resource::DEVICE_URI;

    #[tokio::test]
    async fn test_start_registers_every_resource() {
        let system = ServerSystem::start(&HostConfig::default()).unwrap();
        for uri in [LIGHT_URI, LEFT_DOOR_URI, RIGHT_DOOR_URI, TEMPERATURE_URI, DEVICE_URI] {
            assert!(system.platform().is_registered(uri), "{} not registered", uri);
        }

        let platform = system.platform().clone();
        system.shutdown().await.unwrap();
        assert_eq!(platform.resource_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_skips_already_destroyed() {
        let system = ServerSystem::start(&HostConfig::default()).unwrap();
        system.left_door.destroy().await.unwrap();

        system.shutdown().await.unwrap();
    }
}
