//! # Requests
//!
//! [`EntityRequest`] is what the platform hands to an entity handler. The
//! handler flags say *why* the handler is being invoked (initialisation, a
//! client request, an observe registration change) and may be combined.
//! [`ClientRequest`] is the client-side counterpart sent through a
//! [`RequestTransport`](crate::platform::RequestTransport).

use super::handle::{ObservationId, RequestHandle, ResourceHandle};
use super::representation::Representation;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use thiserror::Error;

/// CRUD method carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl RequestMethod {
    /// PUT and POST must carry a representation.
    pub fn requires_representation(self) -> bool {
        matches!(self, RequestMethod::Put | RequestMethod::Post)
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMethod::Get => f.write_str("GET"),
            RequestMethod::Put => f.write_str("PUT"),
            RequestMethod::Post => f.write_str("POST"),
            RequestMethod::Delete => f.write_str("DELETE"),
        }
    }
}

/// Reasons an entity handler is invoked. Several may be set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct HandlerFlags(u8);

impl HandlerFlags {
    pub const INIT: Self = Self(0b001);
    pub const REQUEST: Self = Self(0b010);
    pub const OBSERVE: Self = Self(0b100);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for HandlerFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for HandlerFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::INIT, "INIT"),
            (Self::REQUEST, "REQUEST"),
            (Self::OBSERVE, "OBSERVE"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Observe registration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveAction {
    Register,
    Unregister,
}

/// Observer registration details carried with the OBSERVE flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationInfo {
    pub action: ObserveAction,
    pub id: ObservationId,
}

/// Query parameters attached to a request (`if`, `rt`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interface requested with `if=`.
    pub fn interface(&self) -> Option<&str> {
        self.get("if")
    }
}

/// Vendor header option carried alongside a request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOption {
    pub id: u16,
    pub value: Vec<u8>,
}

/// Why a request cannot be processed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("request carries no handler flags")]
    NoFlags,
    #[error("request flag set without a method")]
    MissingMethod,
    #[error("{0} request without a representation")]
    MissingRepresentation(RequestMethod),
    #[error("observe flag set without observation info")]
    MissingObservation,
    #[error("interface {requested} not supported by {uri}")]
    UnsupportedInterface { uri: String, requested: String },
}

/// Request delivered to an entity handler.
#[derive(Debug, Clone)]
pub struct EntityRequest {
    pub request_handle: RequestHandle,
    pub resource_handle: ResourceHandle,
    pub uri: String,
    pub flags: HandlerFlags,
    pub method: Option<RequestMethod>,
    pub query: QueryParams,
    pub header_options: Vec<HeaderOption>,
    pub representation: Option<Representation>,
    pub observation: Option<ObservationInfo>,
}

impl EntityRequest {
    /// A bare request for `uri` with the given flags and nothing else.
    pub fn new(
        request_handle: RequestHandle,
        resource_handle: ResourceHandle,
        uri: impl Into<String>,
        flags: HandlerFlags,
    ) -> Self {
        Self {
            request_handle,
            resource_handle,
            uri: uri.into(),
            flags,
            method: None,
            query: QueryParams::default(),
            header_options: Vec::new(),
            representation: None,
            observation: None,
        }
    }

    /// Builds the handler-side request for a client request.
    pub fn from_client(
        request_handle: RequestHandle,
        resource_handle: ResourceHandle,
        uri: impl Into<String>,
        client: ClientRequest,
    ) -> Self {
        let mut request = Self::new(request_handle, resource_handle, uri, HandlerFlags::REQUEST);
        request.method = Some(client.method);
        request.query = client.query;
        request.header_options = client.header_options;
        request.representation = client.representation;
        request
    }

    pub fn with_observation(mut self, action: ObserveAction, id: ObservationId) -> Self {
        self.flags.insert(HandlerFlags::OBSERVE);
        self.observation = Some(ObservationInfo { action, id });
        self
    }

    /// True when the caller waits for a response to this request.
    pub fn expects_response(&self) -> bool {
        self.flags.contains(HandlerFlags::REQUEST)
    }

    /// Structural checks applied before any side effect.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        if self.flags.is_empty() {
            return Err(InvalidRequest::NoFlags);
        }
        if self.flags.contains(HandlerFlags::REQUEST) {
            let method = self.method.ok_or(InvalidRequest::MissingMethod)?;
            if method.requires_representation() && self.representation.is_none() {
                return Err(InvalidRequest::MissingRepresentation(method));
            }
        }
        if self.flags.contains(HandlerFlags::OBSERVE) && self.observation.is_none() {
            return Err(InvalidRequest::MissingObservation);
        }
        Ok(())
    }
}

/// Request issued by a client through a transport.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    pub method: RequestMethod,
    pub representation: Option<Representation>,
    pub query: QueryParams,
    pub header_options: Vec<HeaderOption>,
}

impl ClientRequest {
    fn with_method(method: RequestMethod, representation: Option<Representation>) -> Self {
        Self {
            method,
            representation,
            query: QueryParams::default(),
            header_options: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::with_method(RequestMethod::Get, None)
    }

    pub fn put(representation: Representation) -> Self {
        Self::with_method(RequestMethod::Put, Some(representation))
    }

    pub fn post(representation: Representation) -> Self {
        Self::with_method(RequestMethod::Post, Some(representation))
    }

    pub fn delete() -> Self {
        Self::with_method(RequestMethod::Delete, None)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key, value);
        self
    }

    pub fn with_header(mut self, id: u16, value: impl Into<Vec<u8>>) -> Self {
        self.header_options.push(HeaderOption {
            id,
            value: value.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(flags: HandlerFlags) -> EntityRequest {
        EntityRequest::new(RequestHandle(1), ResourceHandle(1), "/a/light", flags)
    }

    #[test]
    fn test_flags_combine() {
        let flags = HandlerFlags::INIT | HandlerFlags::REQUEST;
        assert!(flags.contains(HandlerFlags::INIT));
        assert!(flags.contains(HandlerFlags::REQUEST));
        assert!(!flags.contains(HandlerFlags::OBSERVE));
        assert!(!flags.contains(HandlerFlags::empty()));
        assert_eq!(flags.to_string(), "INIT|REQUEST");
    }

    #[test]
    fn test_validate_rejects_malformed_requests() {
        assert_eq!(
            request(HandlerFlags::empty()).validate(),
            Err(InvalidRequest::NoFlags)
        );
        assert_eq!(
            request(HandlerFlags::REQUEST).validate(),
            Err(InvalidRequest::MissingMethod)
        );

        let mut put = request(HandlerFlags::REQUEST);
        put.method = Some(RequestMethod::Put);
        assert_eq!(
            put.validate(),
            Err(InvalidRequest::MissingRepresentation(RequestMethod::Put))
        );

        assert_eq!(
            request(HandlerFlags::OBSERVE).validate(),
            Err(InvalidRequest::MissingObservation)
        );
    }

    #[test]
    fn test_from_client_carries_payload() {
        let client = ClientRequest::put(Representation::new().with("state", true))
            .with_query("if", "oic.if.baseline")
            .with_header(2048, vec![1, 2]);
        let request =
            EntityRequest::from_client(RequestHandle(7), ResourceHandle(3), "/a/door", client);

        assert!(request.validate().is_ok());
        assert!(request.expects_response());
        assert_eq!(request.method, Some(RequestMethod::Put));
        assert_eq!(request.query.interface(), Some("oic.if.baseline"));
        assert_eq!(request.header_options.len(), 1);
    }
}
