//! # In-Memory Platform
//!
//! Process-local implementation of [`ResourcePlatform`] and [`RequestTransport`].
//!
//! The registry lives behind one `std::sync::Mutex` that is only ever held for
//! map lookups; entity handlers are always invoked with the lock released, so a
//! handler may call back into the platform (`send_response`, `unregister_resource`)
//! from inside `handle`.

use super::{
    EntityHandler, ObserveSubscription, PlatformError, PlatformResult, RequestTransport,
    ResourceDescriptor, ResourcePlatform, ResourceProperties,
};
use crate::config::PlatformConfig;
use crate::model::{
    ClientRequest, EntityHandlerResult, EntityRequest, EntityResponse, HandlerFlags, Notification,
    ObservationId, ObserveAction, QueryParams, Representation, RequestHandle, ResourceHandle,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct InMemoryPlatform {
    inner: Arc<Inner>,
}

struct Inner {
    request_timeout: Duration,
    registry: Mutex<Registry>,
    next_resource: AtomicU64,
    next_request: AtomicU64,
    next_observation: AtomicU32,
}

#[derive(Default)]
struct Registry {
    resources: HashMap<ResourceHandle, Registration>,
    uris: HashMap<String, ResourceHandle>,
    pending: HashMap<RequestHandle, oneshot::Sender<EntityResponse>>,
}

struct Registration {
    descriptor: ResourceDescriptor,
    handler: Arc<dyn EntityHandler>,
    observers: BTreeMap<ObservationId, Observer>,
}

struct Observer {
    sender: mpsc::UnboundedSender<Notification>,
    next_sequence: u64,
}

impl Observer {
    fn new(sender: mpsc::UnboundedSender<Notification>) -> Self {
        Self {
            sender,
            next_sequence: 1,
        }
    }

    /// The sequence number only advances when the notification was accepted.
    fn deliver(&mut self, uri: &str, id: ObservationId, representation: Representation) -> bool {
        let notification = Notification {
            uri: uri.to_string(),
            observation_id: id,
            sequence: self.next_sequence,
            representation,
        };
        if self.sender.send(notification).is_ok() {
            self.next_sequence += 1;
            true
        } else {
            false
        }
    }
}

impl Registration {
    /// Drops observers whose client side has gone away.
    fn prune_closed(&mut self) -> Vec<ObservationId> {
        let closed: Vec<ObservationId> = self
            .observers
            .iter()
            .filter(|(_, observer)| observer.sender.is_closed())
            .map(|(id, _)| *id)
            .collect();
        for id in &closed {
            self.observers.remove(id);
        }
        closed
    }
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new(&PlatformConfig::default())
    }
}

impl InMemoryPlatform {
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                request_timeout: config.request_timeout(),
                registry: Mutex::new(Registry::default()),
                next_resource: AtomicU64::new(0),
                next_request: AtomicU64::new(0),
                next_observation: AtomicU32::new(0),
            }),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Request handles start at 1; 0 marks unsolicited notifications.
    fn next_request_handle(&self) -> RequestHandle {
        RequestHandle(self.inner.next_request.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn lookup(
        &self,
        uri: &str,
    ) -> PlatformResult<(ResourceHandle, Arc<dyn EntityHandler>, ResourceProperties)> {
        let registry = self.registry();
        let handle = *registry
            .uris
            .get(uri)
            .ok_or_else(|| PlatformError::ResourceNotFound(uri.to_string()))?;
        let registration = registry
            .resources
            .get(&handle)
            .ok_or(PlatformError::UnknownHandle(handle))?;
        Ok((
            handle,
            registration.handler.clone(),
            registration.descriptor.properties,
        ))
    }

    /// Number of registered resources.
    pub fn resource_count(&self) -> usize {
        self.registry().resources.len()
    }

    pub fn is_registered(&self, uri: &str) -> bool {
        self.registry().uris.contains_key(uri)
    }

    /// Observers currently attached to `uri` (0 if the URI is unknown).
    pub fn observer_count(&self, uri: &str) -> usize {
        let registry = self.registry();
        registry
            .uris
            .get(uri)
            .and_then(|handle| registry.resources.get(handle))
            .map_or(0, |registration| registration.observers.len())
    }

    /// Invokes the handler and waits for the matching response.
    async fn dispatch(
        &self,
        handler: Arc<dyn EntityHandler>,
        request: EntityRequest,
    ) -> PlatformResult<EntityResponse> {
        let uri = request.uri.clone();
        let request_handle = request.request_handle;
        let resource_handle = request.resource_handle;

        let (respond_to, response) = oneshot::channel();
        self.registry().pending.insert(request_handle, respond_to);

        let result = handler.handle(request).await;
        if result == EntityHandlerResult::Error {
            let unanswered = self.registry().pending.remove(&request_handle).is_some();
            if unanswered {
                debug!(%uri, request = %request_handle, "Handler failed without responding");
                return Ok(EntityResponse::error(request_handle, resource_handle));
            }
        }

        match tokio::time::timeout(self.inner.request_timeout, response).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) | Err(_) => {
                self.registry().pending.remove(&request_handle);
                let timeout_ms = self.inner.request_timeout.as_millis() as u64;
                warn!(%uri, request = %request_handle, timeout_ms, "Request timed out");
                Err(PlatformError::Timeout { uri, timeout_ms })
            }
        }
    }

    /// Tells the handler about observers dropped by the platform.
    fn release_observers(
        &self,
        handle: ResourceHandle,
        uri: &str,
        handler: Arc<dyn EntityHandler>,
        released: Vec<ObservationId>,
    ) {
        if released.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let requests: Vec<EntityRequest> = released
            .into_iter()
            .map(|id| {
                EntityRequest::new(self.next_request_handle(), handle, uri, HandlerFlags::empty())
                    .with_observation(ObserveAction::Unregister, id)
            })
            .collect();
        runtime.spawn(async move {
            for request in requests {
                debug!(uri = %request.uri, "Releasing closed observer");
                handler.handle(request).await;
            }
        });
    }

    /// Prunes closed observers; returns the handler and whether anyone is left.
    fn prune(&self, handle: ResourceHandle) -> PlatformResult<(String, Arc<dyn EntityHandler>, bool)> {
        let (uri, handler, released, has_observers) = {
            let mut registry = self.registry();
            let registration = registry
                .resources
                .get_mut(&handle)
                .ok_or(PlatformError::UnknownHandle(handle))?;
            let released = registration.prune_closed();
            (
                registration.descriptor.uri.clone(),
                registration.handler.clone(),
                released,
                !registration.observers.is_empty(),
            )
        };
        self.release_observers(handle, &uri, handler.clone(), released);
        Ok((uri, handler, has_observers))
    }

    fn deliver(
        &self,
        handle: ResourceHandle,
        targets: Option<&[ObservationId]>,
        representation: Representation,
    ) -> PlatformResult<usize> {
        let mut registry = self.registry();
        let registration = registry
            .resources
            .get_mut(&handle)
            .ok_or(PlatformError::UnknownHandle(handle))?;
        let uri = registration.descriptor.uri.clone();

        let mut delivered = 0;
        for (id, observer) in registration.observers.iter_mut() {
            let targeted = targets.map_or(true, |targets| targets.contains(id));
            if targeted && observer.deliver(&uri, *id, representation.clone()) {
                delivered += 1;
            }
        }

        if delivered == 0 {
            return Err(PlatformError::NoObservers(handle));
        }
        debug!(%uri, delivered, "Notified observers");
        Ok(delivered)
    }

    fn remove_observer(&self, handle: ResourceHandle, id: ObservationId) -> bool {
        self.registry()
            .resources
            .get_mut(&handle)
            .is_some_and(|registration| registration.observers.remove(&id).is_some())
    }
}

#[async_trait]
impl ResourcePlatform for InMemoryPlatform {
    fn register_resource(
        &self,
        descriptor: ResourceDescriptor,
        handler: Arc<dyn EntityHandler>,
    ) -> PlatformResult<ResourceHandle> {
        if !descriptor.uri.starts_with('/') {
            return Err(PlatformError::InvalidUri(descriptor.uri));
        }

        let mut registry = self.registry();
        if registry.uris.contains_key(&descriptor.uri) {
            return Err(PlatformError::UriAlreadyRegistered(descriptor.uri));
        }

        let handle = ResourceHandle(self.inner.next_resource.fetch_add(1, Ordering::Relaxed) + 1);
        info!(
            uri = %descriptor.uri,
            %handle,
            resource_type = %descriptor.resource_type,
            "Resource registered"
        );
        registry.uris.insert(descriptor.uri.clone(), handle);
        registry.resources.insert(
            handle,
            Registration {
                descriptor,
                handler,
                observers: BTreeMap::new(),
            },
        );
        Ok(handle)
    }

    fn unregister_resource(&self, handle: ResourceHandle) -> PlatformResult<()> {
        let mut registry = self.registry();
        let registration = registry
            .resources
            .remove(&handle)
            .ok_or(PlatformError::UnknownHandle(handle))?;
        registry.uris.remove(&registration.descriptor.uri);
        info!(
            uri = %registration.descriptor.uri,
            %handle,
            observers = registration.observers.len(),
            "Resource unregistered"
        );
        Ok(())
    }

    fn send_response(&self, response: EntityResponse) -> PlatformResult<()> {
        let request_handle = response.request_handle;
        let respond_to = self
            .registry()
            .pending
            .remove(&request_handle)
            .ok_or(PlatformError::RequestNotPending(request_handle))?;
        respond_to
            .send(response)
            .map_err(|_| PlatformError::RequestNotPending(request_handle))
    }

    async fn notify_all_observers(&self, handle: ResourceHandle) -> PlatformResult<usize> {
        let (uri, handler, has_observers) = self.prune(handle)?;
        if !has_observers {
            return Err(PlatformError::NoObservers(handle));
        }

        let request =
            EntityRequest::from_client(self.next_request_handle(), handle, &uri, ClientRequest::get());
        let response = self.dispatch(handler, request).await?;
        if !response.result.is_success() {
            return Err(PlatformError::HandlerFailed {
                uri,
                result: response.result,
            });
        }
        self.deliver(handle, None, response.representation)
    }

    fn notify_list_of_observers(
        &self,
        handle: ResourceHandle,
        observers: &[ObservationId],
        response: EntityResponse,
    ) -> PlatformResult<usize> {
        let (_, _, has_observers) = self.prune(handle)?;
        if !has_observers || observers.is_empty() {
            return Err(PlatformError::NoObservers(handle));
        }
        self.deliver(handle, Some(observers), response.representation)
    }
}

#[async_trait]
impl RequestTransport for InMemoryPlatform {
    async fn find_resources(&self, resource_type: Option<&str>) -> Vec<ResourceDescriptor> {
        let mut found: Vec<ResourceDescriptor> = self
            .registry()
            .resources
            .values()
            .map(|registration| &registration.descriptor)
            .filter(|descriptor| descriptor.properties.discoverable)
            .filter(|descriptor| resource_type.map_or(true, |rt| descriptor.resource_type == rt))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.uri.cmp(&b.uri));
        found
    }

    #[tracing::instrument(skip(self, request), fields(method = %request.method))]
    async fn request(&self, uri: &str, request: ClientRequest) -> PlatformResult<EntityResponse> {
        let (handle, handler, _) = self.lookup(uri)?;
        let request = EntityRequest::from_client(self.next_request_handle(), handle, uri, request);
        self.dispatch(handler, request).await
    }

    #[tracing::instrument(skip(self, query))]
    async fn observe(&self, uri: &str, query: QueryParams) -> PlatformResult<ObserveSubscription> {
        let (handle, handler, properties) = self.lookup(uri)?;
        if !properties.observable {
            return Err(PlatformError::NotObservable(uri.to_string()));
        }

        let id = ObservationId(self.inner.next_observation.fetch_add(1, Ordering::Relaxed) + 1);
        let (sender, receiver) = mpsc::unbounded_channel();
        {
            let mut registry = self.registry();
            let registration = registry
                .resources
                .get_mut(&handle)
                .ok_or_else(|| PlatformError::ResourceNotFound(uri.to_string()))?;
            registration.observers.insert(id, Observer::new(sender));
        }

        let mut get = ClientRequest::get();
        get.query = query;
        let request = EntityRequest::from_client(self.next_request_handle(), handle, uri, get)
            .with_observation(ObserveAction::Register, id);

        let initial = match self.dispatch(handler, request).await {
            Ok(response) if response.result.is_success() => response,
            Ok(response) => {
                self.remove_observer(handle, id);
                return Err(PlatformError::HandlerFailed {
                    uri: uri.to_string(),
                    result: response.result,
                });
            }
            Err(e) => {
                self.remove_observer(handle, id);
                return Err(e);
            }
        };

        info!(%uri, observer = %id, "Observation registered");
        Ok(ObserveSubscription::new(
            uri.to_string(),
            id,
            initial,
            receiver,
            Arc::new(self.clone()),
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_observation(&self, uri: &str, id: ObservationId) -> PlatformResult<()> {
        let Ok((handle, handler, _)) = self.lookup(uri) else {
            debug!("Resource already gone");
            return Ok(());
        };
        if !self.remove_observer(handle, id) {
            debug!("Observer not registered");
            return Ok(());
        }

        let request =
            EntityRequest::from_client(self.next_request_handle(), handle, uri, ClientRequest::get())
                .with_observation(ObserveAction::Unregister, id);
        let response = self.dispatch(handler, request).await?;
        info!(result = %response.result, "Observation cancelled");
        Ok(())
    }
}
