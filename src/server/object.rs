//! # Resource Object
//!
//! Server-side handle on one hosted resource. Building it spawns the resource
//! actor and registers an [`EntityDispatcher`] with the platform; local code
//! then reads and writes attributes through the object while remote clients go
//! through the platform. Both paths end up in the same actor.
//!
//! Once the resource is destroyed (locally or by a client DELETE) every method
//! returns [`ResourceError::IllegalState`]. Dropping the object does not
//! unregister the resource.

use super::dispatcher::EntityDispatcher;
use super::error::{ResourceError, ResourceResult};
use crate::config::ServerConfig;
use crate::framework::{ResourceActor, ResourceEntity};
use crate::model::{Representation, ResourceHandle};
use crate::platform::{ResourceDescriptor, ResourcePlatform, ResourceProperties};
use std::sync::Arc;

pub struct ResourceObject<T: ResourceEntity> {
    handle: ResourceHandle,
    dispatcher: Arc<EntityDispatcher<T>>,
}

pub struct ResourceObjectBuilder<T: ResourceEntity> {
    uri: String,
    params: T::Create,
    resource_type: String,
    interface: String,
    properties: ResourceProperties,
    config: ServerConfig,
}

impl<T: ResourceEntity> ResourceObjectBuilder<T> {
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    pub fn properties(mut self, properties: ResourceProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates the entity, starts its actor and registers it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self, platform: Arc<dyn ResourcePlatform>) -> ResourceResult<ResourceObject<T>> {
        let entity = T::from_create_params(&self.uri, self.params)
            .map_err(|e| ResourceError::Entity(Box::new(e)))?;

        let (actor, client) = ResourceActor::new(self.uri.as_str(), entity, self.config.channel_buffer);
        let descriptor = ResourceDescriptor::new(self.uri, self.resource_type, self.interface)
            .with_properties(self.properties);
        let dispatcher = Arc::new(EntityDispatcher::new(
            descriptor.clone(),
            client,
            platform.clone(),
            self.config,
        ));

        let handle = platform.register_resource(descriptor, dispatcher.clone())?;
        tokio::spawn(actor.run());

        Ok(ResourceObject { handle, dispatcher })
    }
}

impl<T: ResourceEntity> ResourceObject<T> {
    pub fn builder(uri: impl Into<String>, params: T::Create) -> ResourceObjectBuilder<T> {
        ResourceObjectBuilder {
            uri: uri.into(),
            params,
            resource_type: T::RESOURCE_TYPE.to_string(),
            interface: T::INTERFACE.to_string(),
            properties: ResourceProperties::default(),
            config: ServerConfig::default(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.dispatcher.descriptor().uri
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        self.dispatcher.descriptor()
    }

    pub fn is_destroyed(&self) -> bool {
        self.dispatcher.is_destroyed()
    }

    fn ensure_alive(&self) -> ResourceResult<()> {
        if self.is_destroyed() {
            return Err(ResourceError::destroyed(self.uri()));
        }
        Ok(())
    }

    pub fn handle(&self) -> ResourceResult<ResourceHandle> {
        self.ensure_alive()?;
        Ok(self.handle)
    }

    /// Current representation, as a GET would return it.
    pub async fn attributes(&self) -> ResourceResult<Representation> {
        self.ensure_alive()?;
        Ok(self.dispatcher.client().get().await?)
    }

    /// Local partial update; returns the resulting representation.
    pub async fn set_attributes(&self, representation: Representation) -> ResourceResult<Representation> {
        self.ensure_alive()?;
        Ok(self.dispatcher.client().put(representation).await?)
    }

    /// Copy of the entity state.
    pub async fn entity(&self) -> ResourceResult<T> {
        self.ensure_alive()?;
        Ok(self.dispatcher.client().snapshot().await?)
    }

    /// Pushes the current state to every observer now.
    pub async fn notify_observers(&self) -> ResourceResult<usize> {
        self.ensure_alive()?;
        Ok(self.dispatcher.platform().notify_all_observers(self.handle).await?)
    }

    /// True while the notification loop runs.
    pub fn is_notifying(&self) -> bool {
        self.dispatcher.is_notifying()
    }

    /// Deletes the entity and unregisters it from the platform.
    pub async fn destroy(&self) -> ResourceResult<()> {
        self.dispatcher.teardown(self.handle).await
    }
}
