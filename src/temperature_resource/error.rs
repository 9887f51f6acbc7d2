use crate::model::AttributeError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemperatureError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error("Unsupported temperature units: {0}")]
    UnknownUnits(String),
}
