//! # Platform Errors
//!
//! Failures reported by the platform runtime. Each variant maps to a numeric
//! stack result code through [`PlatformError::code`].

use crate::model::{EntityHandlerResult, RequestHandle, ResourceHandle};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    #[error("URI already registered: {0}")]
    UriAlreadyRegistered(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Unknown resource handle: {0}")]
    UnknownHandle(ResourceHandle),

    #[error("Request {0} already answered or timed out")]
    RequestNotPending(RequestHandle),

    #[error("No observers registered on {0}")]
    NoObservers(ResourceHandle),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource {0} is not observable")]
    NotObservable(String),

    #[error("Request to {uri} timed out after {timeout_ms} ms")]
    Timeout { uri: String, timeout_ms: u64 },

    #[error("Handler for {uri} answered {result}")]
    HandlerFailed {
        uri: String,
        result: EntityHandlerResult,
    },
}

impl PlatformError {
    /// Numeric result code reported to native-style callers.
    pub fn code(&self) -> i32 {
        match self {
            PlatformError::InvalidUri(_) => 20,
            PlatformError::ResourceNotFound(_) => 26,
            PlatformError::UnknownHandle(_) => 27,
            PlatformError::UriAlreadyRegistered(_) => 28,
            PlatformError::RequestNotPending(_) => 29,
            PlatformError::Timeout { .. } => 30,
            PlatformError::NoObservers(_) => 36,
            PlatformError::NotObservable(_) => 37,
            PlatformError::HandlerFailed { .. } => 255,
        }
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            PlatformError::UriAlreadyRegistered("/a".into()),
            PlatformError::InvalidUri("a".into()),
            PlatformError::UnknownHandle(ResourceHandle(1)),
            PlatformError::RequestNotPending(RequestHandle(1)),
            PlatformError::NoObservers(ResourceHandle(1)),
            PlatformError::ResourceNotFound("/a".into()),
            PlatformError::NotObservable("/a".into()),
            PlatformError::Timeout {
                uri: "/a".into(),
                timeout_ms: 10,
            },
            PlatformError::HandlerFailed {
                uri: "/a".into(),
                result: EntityHandlerResult::Error,
            },
        ];
        let mut codes: Vec<i32> = errors.iter().map(PlatformError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
