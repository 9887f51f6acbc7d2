//! # Resource Client
//!
//! Cloneable handle used to talk to a [`ResourceActor`](super::ResourceActor).
//! A send failure means the actor has stopped ([`FrameworkError::ActorClosed`]);
//! a dropped reply means it stopped while the request was queued
//! ([`FrameworkError::ActorDropped`]).

use super::entity::{PostOutcome, ResourceEntity};
use super::error::FrameworkError;
use super::message::{ObserverChange, ResourceRequest, Response, TickReport};
use crate::model::{ObservationId, ObserveAction, Representation};
use tokio::sync::{mpsc, oneshot};

#[derive(Clone)]
pub struct ResourceClient<T: ResourceEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ResourceEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        request: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn get(&self) -> Result<Representation, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Get { respond_to })
            .await
    }

    /// Applies a partial update and returns the resulting representation.
    pub async fn put(&self, representation: Representation) -> Result<Representation, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Put {
            representation,
            respond_to,
        })
        .await
    }

    pub async fn post(
        &self,
        representation: Representation,
    ) -> Result<(PostOutcome<T::Create>, Representation), FrameworkError> {
        self.call(|respond_to| ResourceRequest::Post {
            representation,
            respond_to,
        })
        .await
    }

    /// Stops the actor after `on_delete` succeeds.
    pub async fn delete(&self) -> Result<(), FrameworkError> {
        self.call(|respond_to| ResourceRequest::Delete { respond_to })
            .await
    }

    pub async fn observe(
        &self,
        action: ObserveAction,
        id: ObservationId,
    ) -> Result<ObserverChange, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Observe {
            action,
            id,
            respond_to,
        })
        .await
    }

    pub async fn tick(&self) -> Result<TickReport, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Tick { respond_to })
            .await
    }

    /// Copy of the entity.
    pub async fn snapshot(&self) -> Result<T, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Snapshot { respond_to })
            .await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
