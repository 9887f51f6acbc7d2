//! Data exchanged between clients, the platform and resource handlers.
//!
//! - [`Representation`] / [`AttributeValue`] - resource state
//! - [`EntityRequest`] / [`ClientRequest`] - inbound requests
//! - [`EntityResponse`] / [`Notification`] - outbound responses and observe pushes
//! - [`ResourceHandle`], [`RequestHandle`], [`ObservationId`] - opaque ids

pub mod handle;
pub mod representation;
pub mod request;
pub mod response;

pub use handle::*;
pub use representation::*;
pub use request::*;
pub use response::*;
