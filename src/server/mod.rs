//! Server side: the generic entity handler, the notification loop and the
//! resource object that ties an entity to the platform.

pub mod dispatcher;
pub mod error;
pub mod notifier;
pub mod object;

pub use dispatcher::EntityDispatcher;
pub use error::{ResourceError, ResourceResult};
pub use notifier::{NotificationLoop, NotifierSlot};
pub use object::{ResourceObject, ResourceObjectBuilder};
