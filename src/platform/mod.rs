//! # Platform Contract
//!
//! The runtime that owns resource registrations, routes client requests to
//! entity handlers and fans notifications out to observers.
//!
//! - [`ResourcePlatform`] is the server-side capability resource objects are built on.
//! - [`RequestTransport`] is the client-side view of the same runtime.
//! - [`InMemoryPlatform`] implements both inside the process.

mod error;
mod memory;

pub use error::{PlatformError, PlatformResult};
pub use memory::InMemoryPlatform;

use crate::model::{
    ClientRequest, EntityHandlerResult, EntityRequest, EntityResponse, Notification,
    ObservationId, QueryParams, ResourceHandle,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Baseline interface every resource answers to.
pub const DEFAULT_INTERFACE: &str = "oic.if.baseline";

/// Property flags set at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceProperties {
    pub discoverable: bool,
    pub observable: bool,
}

impl Default for ResourceProperties {
    fn default() -> Self {
        Self {
            discoverable: true,
            observable: true,
        }
    }
}

/// What a resource registers itself as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub resource_type: String,
    pub interface: String,
    pub properties: ResourceProperties,
}

impl ResourceDescriptor {
    pub fn new(
        uri: impl Into<String>,
        resource_type: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            resource_type: resource_type.into(),
            interface: interface.into(),
            properties: ResourceProperties::default(),
        }
    }

    pub fn with_properties(mut self, properties: ResourceProperties) -> Self {
        self.properties = properties;
        self
    }

    /// True when `interface` is served by this resource.
    pub fn supports_interface(&self, interface: &str) -> bool {
        interface == self.interface || interface == DEFAULT_INTERFACE
    }
}

/// Callback the platform invokes for every request targeting a resource.
#[async_trait]
pub trait EntityHandler: Send + Sync {
    async fn handle(&self, request: EntityRequest) -> EntityHandlerResult;
}

/// Server-side platform capability.
#[async_trait]
pub trait ResourcePlatform: Send + Sync {
    /// Fails with [`PlatformError::UriAlreadyRegistered`] for a duplicate URI.
    fn register_resource(
        &self,
        descriptor: ResourceDescriptor,
        handler: Arc<dyn EntityHandler>,
    ) -> PlatformResult<ResourceHandle>;

    /// Fails with [`PlatformError::UnknownHandle`] if `handle` is not registered.
    fn unregister_resource(&self, handle: ResourceHandle) -> PlatformResult<()>;

    /// Fails with [`PlatformError::RequestNotPending`] once the request was answered or timed out.
    fn send_response(&self, response: EntityResponse) -> PlatformResult<()>;

    /// Re-reads the resource and pushes the result to every observer.
    /// Returns how many observers were notified.
    async fn notify_all_observers(&self, handle: ResourceHandle) -> PlatformResult<usize>;

    /// Pushes `response` to the listed observers only.
    fn notify_list_of_observers(
        &self,
        handle: ResourceHandle,
        observers: &[ObservationId],
        response: EntityResponse,
    ) -> PlatformResult<usize>;
}

/// Client-side access to resources hosted on the platform.
#[async_trait]
pub trait RequestTransport: Send + Sync {
    /// Discoverable resources, optionally filtered by resource type.
    async fn find_resources(&self, resource_type: Option<&str>) -> Vec<ResourceDescriptor>;

    async fn request(&self, uri: &str, request: ClientRequest) -> PlatformResult<EntityResponse>;

    async fn observe(&self, uri: &str, query: QueryParams) -> PlatformResult<ObserveSubscription>;

    async fn cancel_observation(&self, uri: &str, id: ObservationId) -> PlatformResult<()>;
}

/// A live observe registration held by a client.
///
/// Notifications stop when the subscription is cancelled or the resource goes away.
pub struct ObserveSubscription {
    uri: String,
    id: ObservationId,
    initial: EntityResponse,
    receiver: mpsc::UnboundedReceiver<Notification>,
    transport: Arc<dyn RequestTransport>,
}

impl ObserveSubscription {
    pub(crate) fn new(
        uri: String,
        id: ObservationId,
        initial: EntityResponse,
        receiver: mpsc::UnboundedReceiver<Notification>,
        transport: Arc<dyn RequestTransport>,
    ) -> Self {
        Self {
            uri,
            id,
            initial,
            receiver,
            transport,
        }
    }

    pub fn id(&self) -> ObservationId {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Response to the registering GET.
    pub fn initial(&self) -> &EntityResponse {
        &self.initial
    }

    /// Next notification, or `None` once the resource stopped serving this observer.
    pub async fn next(&mut self) -> Option<Notification> {
        self.receiver.recv().await
    }

    /// Deregisters the observer. Notifications already queued are discarded.
    pub async fn cancel(self) -> PlatformResult<()> {
        self.transport.cancel_observation(&self.uri, self.id).await
    }
}

impl std::fmt::Debug for ObserveSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserveSubscription")
            .field("uri", &self.uri)
            .field("id", &self.id)
            .finish()
    }
}
