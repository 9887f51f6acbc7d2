//! Process-level wiring: tracing setup and the sample server system.

pub mod server_system;
pub mod tracing;

pub use self::server_system::{
    ServerSystem, LEFT_DOOR_URI, LIGHT_URI, RIGHT_DOOR_URI, TEMPERATURE_URI,
};
pub use self::tracing::setup_tracing;
