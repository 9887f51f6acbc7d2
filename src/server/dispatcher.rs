//! # Entity Dispatcher
//!
//! The one entity handler shared by every resource type. It validates the
//! request, then handles each flag that is set:
//!
//! | Flag      | Effect |
//! |-----------|--------|
//! | `INIT`    | logged only |
//! | `REQUEST` | GET / PUT / POST / DELETE through the resource actor, then exactly one response |
//! | `OBSERVE` | register / unregister the observer; the first registration starts the notification loop |
//!
//! Invalid requests are answered with ERROR before anything is touched. A
//! DELETE that also carries OBSERVE answers RESOURCE_DELETED and skips the
//! observe part.
//! Platform and entity failures are logged here and turned into ERROR; they
//! never propagate to the platform.

use super::error::{ResourceError, ResourceResult};
use super::notifier::{NotificationLoop, NotifierSlot};
use super::object::ResourceObject;
use crate::config::ServerConfig;
use crate::framework::{PostOutcome, ResourceClient, ResourceEntity};
use crate::model::{
    EntityHandlerResult, EntityRequest, EntityResponse, HandlerFlags, InvalidRequest,
    ObserveAction, Representation, RequestMethod, ResourceHandle,
};
use crate::platform::{EntityHandler, ResourceDescriptor, ResourcePlatform};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct EntityDispatcher<T: ResourceEntity> {
    descriptor: ResourceDescriptor,
    client: ResourceClient<T>,
    platform: Arc<dyn ResourcePlatform>,
    config: ServerConfig,
    notifier: Arc<NotifierSlot>,
    destroyed: AtomicBool,
}

impl<T: ResourceEntity> EntityDispatcher<T> {
    pub fn new(
        descriptor: ResourceDescriptor,
        client: ResourceClient<T>,
        platform: Arc<dyn ResourcePlatform>,
        config: ServerConfig,
    ) -> Self {
        Self {
            descriptor,
            client,
            platform,
            config,
            notifier: Arc::default(),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn client(&self) -> &ResourceClient<T> {
        &self.client
    }

    pub fn platform(&self) -> &Arc<dyn ResourcePlatform> {
        &self.platform
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// True while a notification loop task is alive.
    pub fn is_notifying(&self) -> bool {
        self.notifier.is_running()
    }

    /// Deletes the entity, stops notifications and unregisters `handle`.
    pub async fn teardown(&self, handle: ResourceHandle) -> ResourceResult<()> {
        let uri = self.descriptor.uri.as_str();
        if self.is_destroyed() {
            return Err(ResourceError::destroyed(uri));
        }

        self.client.delete().await?;
        self.destroyed.store(true, Ordering::SeqCst);
        self.stop_notifier();
        self.platform.unregister_resource(handle)?;
        info!(uri, %handle, "Resource destroyed");
        Ok(())
    }

    fn check(&self, request: &EntityRequest) -> Result<(), InvalidRequest> {
        request.validate()?;
        if let Some(interface) = request.query.interface() {
            if !self.descriptor.supports_interface(interface) {
                return Err(InvalidRequest::UnsupportedInterface {
                    uri: self.descriptor.uri.clone(),
                    requested: interface.to_string(),
                });
            }
        }
        Ok(())
    }

    fn respond(
        &self,
        request: &EntityRequest,
        result: EntityHandlerResult,
        representation: Representation,
    ) -> ResourceResult<EntityHandlerResult> {
        self.platform
            .send_response(EntityResponse::for_request(request, result, representation))?;
        Ok(result)
    }

    async fn handle_request(&self, request: &EntityRequest) -> ResourceResult<EntityHandlerResult> {
        let Some(method) = request.method else {
            return Err(InvalidRequest::MissingMethod.into());
        };

        match method {
            RequestMethod::Get if T::SLOW => {
                self.respond_later(request.clone());
                Ok(EntityHandlerResult::Slow)
            }
            RequestMethod::Get => {
                let representation = self.client.get().await?;
                self.respond(request, EntityHandlerResult::Ok, representation)
            }
            RequestMethod::Put => {
                let inbound = required_representation(request, method)?;
                let representation = self.client.put(inbound).await?;
                self.respond(request, EntityHandlerResult::Ok, representation)
            }
            RequestMethod::Post => {
                let inbound = required_representation(request, method)?;
                match self.client.post(inbound).await? {
                    (PostOutcome::Updated, representation) => {
                        self.respond(request, EntityHandlerResult::Ok, representation)
                    }
                    (PostOutcome::CreateChild { uri, params }, _) => {
                        self.create_child(request, uri, params).await
                    }
                }
            }
            RequestMethod::Delete => {
                self.teardown(request.resource_handle).await?;
                self.respond(
                    request,
                    EntityHandlerResult::ResourceDeleted,
                    Representation::new(),
                )
            }
        }
    }

    async fn create_child(
        &self,
        request: &EntityRequest,
        uri: String,
        params: T::Create,
    ) -> ResourceResult<EntityHandlerResult> {
        let child = ResourceObject::<T>::builder(uri.as_str(), params)
            .resource_type(self.descriptor.resource_type.as_str())
            .interface(self.descriptor.interface.as_str())
            .properties(self.descriptor.properties)
            .config(self.config.clone())
            .build(self.platform.clone())?;

        let mut representation = child.attributes().await?;
        representation.set_created_uri(uri.as_str());
        info!(parent = %self.descriptor.uri, child = %uri, "Child resource created");

        let response = EntityResponse::for_request(
            request,
            EntityHandlerResult::ResourceCreated,
            representation,
        )
        .with_new_resource_uri(uri);
        self.platform.send_response(response)?;
        Ok(EntityHandlerResult::ResourceCreated)
    }

    /// Completes a slow GET from a separate task.
    fn respond_later(&self, request: EntityRequest) {
        let client = self.client.clone();
        let platform = self.platform.clone();
        tokio::spawn(async move {
            let response = match client.get().await {
                Ok(representation) => {
                    EntityResponse::for_request(&request, EntityHandlerResult::Ok, representation)
                }
                Err(e) => {
                    warn!(uri = %request.uri, error = %e, "Slow GET failed");
                    EntityResponse::for_request(
                        &request,
                        EntityHandlerResult::Error,
                        Representation::new(),
                    )
                }
            };
            match platform.send_response(response) {
                Ok(()) => debug!(uri = %request.uri, "Slow response sent"),
                Err(e) => warn!(uri = %request.uri, error = %e, "Slow response dropped"),
            }
        });
    }

    async fn handle_observe(&self, request: &EntityRequest) -> ResourceResult<()> {
        let Some(observation) = request.observation else {
            return Err(InvalidRequest::MissingObservation.into());
        };

        let change = self.client.observe(observation.action, observation.id).await?;
        let uri = self.descriptor.uri.as_str();
        match observation.action {
            ObserveAction::Register => {
                info!(uri, observer = %observation.id, observers = change.observers, changed = change.changed, "Observer registered");
                self.ensure_notifier(request.resource_handle);
            }
            ObserveAction::Unregister => {
                info!(uri, observer = %observation.id, observers = change.observers, changed = change.changed, "Observer unregistered");
            }
        }
        Ok(())
    }

    fn ensure_notifier(&self, handle: ResourceHandle) {
        let notification_loop = NotificationLoop::new(
            self.descriptor.uri.as_str(),
            handle,
            self.client.clone(),
            self.platform.clone(),
            &self.config,
        );
        if !self.notifier.ensure(|token| notification_loop.spawn(token)) {
            debug!(uri = %self.descriptor.uri, "Notification loop already running");
        }
    }

    fn stop_notifier(&self) {
        self.notifier.stop();
    }
}

fn required_representation(
    request: &EntityRequest,
    method: RequestMethod,
) -> Result<Representation, InvalidRequest> {
    request
        .representation
        .clone()
        .ok_or(InvalidRequest::MissingRepresentation(method))
}

#[async_trait]
impl<T: ResourceEntity> EntityHandler for EntityDispatcher<T> {
    async fn handle(&self, request: EntityRequest) -> EntityHandlerResult {
        let uri = self.descriptor.uri.as_str();

        if let Err(e) = self.check(&request) {
            warn!(uri, flags = %request.flags, error = %e, "Rejected request");
            return EntityHandlerResult::Error;
        }
        if self.is_destroyed() {
            warn!(uri, flags = %request.flags, "Request for destroyed resource");
            return EntityHandlerResult::Error;
        }

        if request.flags.contains(HandlerFlags::INIT) {
            debug!(uri, "Init");
        }

        let mut result = EntityHandlerResult::Ok;
        if request.flags.contains(HandlerFlags::REQUEST) {
            result = match self.handle_request(&request).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(uri, method = ?request.method, error = %e, "Request failed");
                    return EntityHandlerResult::Error;
                }
            };
        }

        if request.flags.contains(HandlerFlags::OBSERVE) {
            if result == EntityHandlerResult::ResourceDeleted {
                debug!(uri, "Observe ignored for deleted resource");
                return result;
            }
            if let Err(e) = self.handle_observe(&request).await {
                warn!(uri, error = %e, "Observe failed");
                return EntityHandlerResult::Error;
            }
        }

        result
    }
}
