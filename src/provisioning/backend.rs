//! The security-provisioning operations the chain drives. Every call is one
//! asynchronous round trip whose completion carries either a value or a
//! nonzero error code.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A device as seen by provisioning discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceInfo {
    pub device_id: String,
    pub owned: bool,
}

impl DeviceInfo {
    pub fn new(device_id: impl Into<String>, owned: bool) -> Self {
        Self {
            device_id: device_id.into(),
            owned,
        }
    }
}

/// Nonzero completion code reported by the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("code {code}: {message}")]
pub struct BackendError {
    pub code: i32,
    pub message: String,
}

impl BackendError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub type Completion<T> = Result<T, BackendError>;

#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    async fn discover_unowned(&self, timeout: Duration) -> Completion<Vec<DeviceInfo>>;

    async fn transfer_ownership(&self, device: &DeviceInfo) -> Completion<()>;

    /// True once the device's services are up after ownership transfer.
    async fn is_ready(&self, device: &DeviceInfo) -> Completion<bool>;

    async fn discover_owned(&self, timeout: Duration) -> Completion<Vec<DeviceInfo>>;

    /// Provisions pairwise credentials between two owned devices, linking them.
    async fn provision_pairwise(&self, first: &DeviceInfo, second: &DeviceInfo) -> Completion<()>;

    async fn provision_acl(&self, device: &DeviceInfo) -> Completion<()>;

    /// Ids of the devices linked to `device`.
    async fn get_linked_devices(&self, device: &DeviceInfo) -> Completion<Vec<String>>;

    async fn unlink(&self, device: &DeviceInfo, peer: &str) -> Completion<()>;

    /// Revokes the device's credentials and removes it from the network.
    async fn remove_device(&self, device: &DeviceInfo, timeout: Duration) -> Completion<()>;
}
