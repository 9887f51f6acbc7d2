//! Error types for the door resource.

use crate::model::AttributeError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DoorError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error("Door side must not be empty")]
    EmptySide,
}
