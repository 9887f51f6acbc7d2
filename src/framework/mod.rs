//! # Resource Actor Framework
//!
//! Generic per-resource actor: a [`ResourceActor`] task owns one
//! [`ResourceEntity`] and answers [`ResourceRequest`]s sent through a
//! cloneable [`ResourceClient`].

pub mod actor;
pub mod client;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use entity::{PostOutcome, ResourceEntity};
pub use error::FrameworkError;
pub use message::{ObserverChange, ResourceRequest, Response, TickReport};
