//! # OIC Resource Host
//!
//! > **Resource-oriented actors behind an OIC-style request/observe contract.**
//!
//! Every hosted resource (a light, a door, a temperature sensor, the device
//! information resource) is a [`ResourceEntity`](framework::ResourceEntity)
//! owned by its own tokio task. The platform routes GET/PUT/POST/DELETE and
//! OBSERVE requests to one generic entity handler, which forwards them to the
//! owning actor; a per-resource notification loop pushes state changes to
//! observers.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. Data ([`model`], [`config`])
//! Representations, requests, responses and opaque handles; the TOML host
//! configuration.
//!
//! ### 2. The Runtime Contract ([`platform`])
//! - **Role**: The capability traits resource objects and clients are written against.
//! - **Key items**: [`ResourcePlatform`](platform::ResourcePlatform),
//!   [`RequestTransport`](platform::RequestTransport),
//!   [`InMemoryPlatform`](platform::InMemoryPlatform).
//!
//! ### 3. The Engine ([`framework`])
//! - **Role**: The generic `ResourceActor<T>` and its client. Entity state is
//!   only touched by the actor, so one resource never has two mutators.
//! - **Key items**: [`ResourceActor`](framework::ResourceActor),
//!   [`ResourceClient`](framework::ResourceClient), [`MockClient`](framework::mock::MockClient).
//!
//! ### 4. The Server ([`server`])
//! - **Role**: One [`EntityDispatcher`](server::EntityDispatcher) handles every
//!   request flag for every resource type; [`ResourceObject`](server::ResourceObject)
//!   is the local handle, [`NotificationLoop`](server::NotificationLoop) the
//!   observe pump.
//!
//! ### 5. The Resources ([`light_resource`], [`door_resource`], [`temperature_resource`], [`device_resource`])
//! Concrete entities: attribute parsing and per-method behavior only.
//!
//! ### 6. The Client Side ([`clients`], [`provisioning`])
//! Discovery with cancel, remote resource access, and the provisioning chain
//! from unowned devices to revoked credentials.
//!
//! ### 7. Wiring ([`lifecycle`])
//! Tracing setup and the [`ServerSystem`](lifecycle::ServerSystem) that hosts
//! the sample resources.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Host the sample resources and observe the light for five notifications
//! RUST_LOG=info cargo run -- serve --ticks 5
//!
//! # Run the provisioning chain against a simulated network of three devices
//! cargo run -- provision --devices 3
//! ```

pub mod clients;
pub mod config;
pub mod device_resource;
pub mod door_resource;
pub mod framework;
pub mod lifecycle;
pub mod light_resource;
pub mod model;
pub mod platform;
pub mod provisioning;
pub mod server;
pub mod temperature_resource;
