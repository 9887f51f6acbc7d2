//! Error types for the light resource.

use crate::model::AttributeError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LightError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Power levels start at zero.
    #[error("Power must not be negative, got {0}")]
    NegativePower(i64),
}
