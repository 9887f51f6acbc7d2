//! Errors returned to local callers of a [`ResourceObject`](super::ResourceObject).

use crate::framework::FrameworkError;
use crate::model::{AttributeError, EntityHandlerResult, InvalidRequest};
use crate::platform::PlatformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource was destroyed (or never started).
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),

    #[error("Entity error: {0}")]
    Entity(Box<dyn std::error::Error + Send + Sync>),

    #[error("Request failed with {0}")]
    RequestFailed(EntityHandlerResult),
}

impl ResourceError {
    pub fn destroyed(uri: &str) -> Self {
        ResourceError::IllegalState(format!("{} has been destroyed", uri))
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, ResourceError::IllegalState(_))
    }
}

impl From<FrameworkError> for ResourceError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                ResourceError::IllegalState("resource actor has stopped".into())
            }
            FrameworkError::EntityError(inner) => ResourceError::Entity(inner),
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;
