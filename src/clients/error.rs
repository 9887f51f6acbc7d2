//! Client-side errors.

use crate::model::EntityHandlerResult;
use crate::platform::PlatformError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The resource answered with an unexpected result code.
    #[error("{uri} answered {result}")]
    Rejected {
        uri: String,
        result: EntityHandlerResult,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;
