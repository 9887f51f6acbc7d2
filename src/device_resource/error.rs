//! Error types for the device resource.

use crate::model::AttributeError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeviceError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error("Device id must not be empty")]
    MissingDeviceId,
}
