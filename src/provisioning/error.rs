use super::backend::BackendError;
use super::stage::ProvisioningStage;
use thiserror::Error;

/// Why the chain halted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProvisioningError {
    #[error("{stage} failed for {device}: {source}")]
    StageFailed {
        stage: ProvisioningStage,
        device: String,
        source: BackendError,
    },

    #[error("Device {device} not ready after {waited_ms} ms")]
    NotReady { device: String, waited_ms: u64 },

    #[error("{stage} task aborted: {message}")]
    TaskAborted {
        stage: ProvisioningStage,
        message: String,
    },
}

impl ProvisioningError {
    /// Backend completion code, when the failure came from one.
    pub fn code(&self) -> Option<i32> {
        match self {
            ProvisioningError::StageFailed { source, .. } => Some(source.code),
            _ => None,
        }
    }
}
