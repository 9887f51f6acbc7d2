//! # Resource Actor
//!
//! The task that owns one resource's state: its entity and its observer set.
//! Messages are processed one at a time, so the entity is never shared and
//! needs no lock. Separate resources run separate actors and never contend.
//!
//! ```text
//! let (actor, client) = ResourceActor::new("/a/light", light, 32);
//! tokio::spawn(actor.run());
//! let representation = client.get().await?;
//! ```
//!
//! The loop ends after a successful DELETE or once every client is dropped.

use super::client::ResourceClient;
use super::entity::ResourceEntity;
use super::error::FrameworkError;
use super::message::{ObserverChange, ResourceRequest, TickReport};
use crate::model::{ObservationId, ObserveAction};
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct ResourceActor<T: ResourceEntity> {
    uri: String,
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    entity: T,
    observers: BTreeSet<ObservationId>,
}

impl<T: ResourceEntity> ResourceActor<T> {
    pub fn new(uri: impl Into<String>, entity: T, buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            uri: uri.into(),
            receiver,
            entity,
            observers: BTreeSet::new(),
        };
        (actor, ResourceClient::new(sender))
    }

    pub async fn run(mut self) {
        let uri = self.uri.clone();
        let resource_type = T::RESOURCE_TYPE;
        info!(%uri, resource_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Get { respond_to } => {
                    debug!(%uri, "Get");
                    let result = self.entity.on_get().await.map_err(entity_error);
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Put {
                    representation,
                    respond_to,
                } => {
                    debug!(%uri, %representation, "Put");
                    let result = match self.entity.on_put(&representation).await {
                        Ok(()) => {
                            info!(%uri, "Updated");
                            Ok(self.entity.representation())
                        }
                        Err(e) => {
                            warn!(%uri, error = %e, "Put failed");
                            Err(entity_error(e))
                        }
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Post {
                    representation,
                    respond_to,
                } => {
                    debug!(%uri, %representation, "Post");
                    let result = match self.entity.on_post(&representation).await {
                        Ok(outcome) => Ok((outcome, self.entity.representation())),
                        Err(e) => {
                            warn!(%uri, error = %e, "Post failed");
                            Err(entity_error(e))
                        }
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Delete { respond_to } => {
                    debug!(%uri, "Delete");
                    if let Err(e) = self.entity.on_delete().await {
                        warn!(%uri, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(entity_error(e)));
                        continue;
                    }
                    info!(%uri, "Deleted");
                    let _ = respond_to.send(Ok(()));
                    break;
                }
                ResourceRequest::Observe {
                    action,
                    id,
                    respond_to,
                } => {
                    let changed = match action {
                        ObserveAction::Register => self.observers.insert(id),
                        ObserveAction::Unregister => self.observers.remove(&id),
                    };
                    debug!(%uri, observer = %id, ?action, changed, "Observe");
                    let _ = respond_to.send(Ok(ObserverChange {
                        changed,
                        observers: self.observers.len(),
                    }));
                }
                ResourceRequest::Tick { respond_to } => {
                    let result = match self.entity.on_tick() {
                        Ok(()) => Ok(TickReport {
                            representation: self.entity.representation(),
                            observers: self.observers.iter().copied().collect(),
                        }),
                        Err(e) => {
                            warn!(%uri, error = %e, "Tick failed");
                            Err(entity_error(e))
                        }
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Snapshot { respond_to } => {
                    let _ = respond_to.send(Ok(self.entity.clone()));
                }
            }
        }

        info!(%uri, observers = self.observers.len(), "Shutdown");
    }
}

fn entity_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> FrameworkError {
    FrameworkError::EntityError(Box::new(e))
}
