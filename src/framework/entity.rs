//! # ResourceEntity Trait
//!
//! The strategy a resource plugs into the generic [`ResourceActor`](super::ResourceActor).
//! The actor owns one entity and calls these hooks in response to requests; the
//! entity never sees handler flags, platform handles or responses.
//!
//! Only [`from_create_params`](ResourceEntity::from_create_params),
//! [`representation`](ResourceEntity::representation) and
//! [`on_put`](ResourceEntity::on_put) are required. The remaining hooks default to:
//! - GET returns the current representation;
//! - POST behaves like PUT;
//! - DELETE and ticks do nothing.

use crate::model::Representation;
use async_trait::async_trait;
use std::fmt::Debug;

/// Result of a POST.
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome<C> {
    /// The POST was applied to this resource like a PUT.
    Updated,
    /// The POST asks for a new resource at `uri` built from `params`.
    CreateChild { uri: String, params: C },
}

#[async_trait]
pub trait ResourceEntity: Clone + Debug + Send + Sync + 'static {
    /// Construction parameters, also used for POST-created children.
    type Create: Send + Sync + Debug;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Resource type name registered with the platform (e.g. `core.light`).
    const RESOURCE_TYPE: &'static str;

    /// Interface name registered with the platform.
    const INTERFACE: &'static str;

    /// GET responses are completed on a separate task.
    const SLOW: bool = false;

    fn from_create_params(uri: &str, params: Self::Create) -> Result<Self, Self::Error>;

    /// Current state as an attribute map.
    fn representation(&self) -> Representation;

    async fn on_get(&mut self) -> Result<Representation, Self::Error> {
        Ok(self.representation())
    }

    /// Partial update: keys absent from `representation` stay unchanged.
    async fn on_put(&mut self, representation: &Representation) -> Result<(), Self::Error>;

    async fn on_post(
        &mut self,
        representation: &Representation,
    ) -> Result<PostOutcome<Self::Create>, Self::Error> {
        self.on_put(representation).await?;
        Ok(PostOutcome::Updated)
    }

    async fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Deterministic state change applied once per notification tick.
    fn on_tick(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
