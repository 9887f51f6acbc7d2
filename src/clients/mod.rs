//! Client side: resource discovery and remote resource access.

pub mod discovery;
pub mod error;
pub mod remote_resource;

pub use discovery::DiscoveryTask;
pub use error::{ClientError, ClientResult};
pub use remote_resource::RemoteResource;
