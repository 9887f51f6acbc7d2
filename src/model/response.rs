//! Responses produced by entity handlers and notifications pushed to observers.

use super::handle::{ObservationId, RequestHandle, ResourceHandle};
use super::representation::Representation;
use super::request::{EntityRequest, HeaderOption};
use std::fmt;

/// Outcome of one entity handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityHandlerResult {
    Ok,
    Error,
    /// The response will be sent later from another task.
    Slow,
    ResourceCreated,
    ResourceDeleted,
}

impl EntityHandlerResult {
    pub fn is_success(self) -> bool {
        !matches!(self, EntityHandlerResult::Error)
    }
}

impl fmt::Display for EntityHandlerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityHandlerResult::Ok => f.write_str("OK"),
            EntityHandlerResult::Error => f.write_str("ERROR"),
            EntityHandlerResult::Slow => f.write_str("SLOW"),
            EntityHandlerResult::ResourceCreated => f.write_str("RESOURCE_CREATED"),
            EntityHandlerResult::ResourceDeleted => f.write_str("RESOURCE_DELETED"),
        }
    }
}

/// Response to one request, sent through
/// [`ResourcePlatform::send_response`](crate::platform::ResourcePlatform::send_response).
#[derive(Debug, Clone, PartialEq)]
pub struct EntityResponse {
    pub request_handle: RequestHandle,
    pub resource_handle: ResourceHandle,
    pub result: EntityHandlerResult,
    pub representation: Representation,
    pub new_resource_uri: Option<String>,
    pub header_options: Vec<HeaderOption>,
}

impl EntityResponse {
    /// Response answering `request`.
    pub fn for_request(
        request: &EntityRequest,
        result: EntityHandlerResult,
        representation: Representation,
    ) -> Self {
        Self {
            request_handle: request.request_handle,
            resource_handle: request.resource_handle,
            result,
            representation,
            new_resource_uri: None,
            header_options: Vec::new(),
        }
    }

    /// Error response with an empty representation.
    pub fn error(request_handle: RequestHandle, resource_handle: ResourceHandle) -> Self {
        Self {
            request_handle,
            resource_handle,
            result: EntityHandlerResult::Error,
            representation: Representation::new(),
            new_resource_uri: None,
            header_options: Vec::new(),
        }
    }

    /// Unsolicited response used for list-of-observers notifications.
    pub fn notification(resource_handle: ResourceHandle, representation: Representation) -> Self {
        Self {
            request_handle: RequestHandle(0),
            resource_handle,
            result: EntityHandlerResult::Ok,
            representation,
            new_resource_uri: None,
            header_options: Vec::new(),
        }
    }

    pub fn with_new_resource_uri(mut self, uri: impl Into<String>) -> Self {
        self.new_resource_uri = Some(uri.into());
        self
    }
}

/// Representation update delivered to one observer.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub uri: String,
    pub observation_id: ObservationId,
    /// Starts at 1 and grows by one per notification delivered to this observer.
    pub sequence: u64,
    pub representation: Representation,
}
