//! # Messages
//!
//! Requests sent from a [`ResourceClient`](super::ResourceClient) to its
//! [`ResourceActor`](super::ResourceActor). Every variant carries a oneshot
//! sender for the reply.

use super::entity::{PostOutcome, ResourceEntity};
use super::error::FrameworkError;
use crate::model::{ObservationId, ObserveAction, Representation};
use tokio::sync::oneshot;

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Effect of an observe registration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverChange {
    /// False for a repeated REGISTER or an UNREGISTER of an absent id.
    pub changed: bool,
    /// Observers left after the change.
    pub observers: usize,
}

/// State after one notification tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub representation: Representation,
    pub observers: Vec<ObservationId>,
}

#[derive(Debug)]
pub enum ResourceRequest<T: ResourceEntity> {
    Get {
        respond_to: Response<Representation>,
    },
    Put {
        representation: Representation,
        respond_to: Response<Representation>,
    },
    Post {
        representation: Representation,
        respond_to: Response<(PostOutcome<T::Create>, Representation)>,
    },
    /// Runs `on_delete` and stops the actor.
    Delete { respond_to: Response<()> },
    Observe {
        action: ObserveAction,
        id: ObservationId,
        respond_to: Response<ObserverChange>,
    },
    Tick {
        respond_to: Response<TickReport>,
    },
    Snapshot {
        respond_to: Response<T>,
    },
}
