//! Client-side provisioning chain: onboarding unowned devices, then
//! provisioning credentials and ACLs, then tearing the links down again.

pub mod backend;
pub mod client;
pub mod error;
pub mod simulated;
pub mod stage;

pub use backend::{BackendError, Completion, DeviceInfo, ProvisioningBackend};
pub use client::{ProvisioningClient, ProvisioningReport};
pub use error::ProvisioningError;
pub use simulated::{BackendCall, SimulatedNetwork};
pub use stage::ProvisioningStage;
