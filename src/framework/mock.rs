//! # Mock Client
//!
//! `MockClient<T>` hands out a real [`ResourceClient<T>`] whose requests are
//! answered from a queue of expectations instead of a running actor. Use it to
//! test code that sits *around* a resource actor (the entity dispatcher, for
//! instance) without spawning one, and to inject failures that are awkward to
//! provoke on a real entity.
//!
//! ```rust,ignore
//! let mut mock = MockClient::<Light>::new();
//! mock.expect_get().return_ok(Representation::new().with("state", true));
//! mock.expect_put().return_err(FrameworkError::ActorClosed);
//!
//! let client = mock.client();
//! assert!(client.get().await.is_ok());
//! assert!(client.put(Representation::new()).await.is_err());
//! mock.verify();
//! ```
//!
//! Expectations are consumed in order. A request that does not match the next
//! expectation panics the background task, which surfaces in the test as
//! [`FrameworkError::ActorDropped`].

use super::client::ResourceClient;
use super::entity::{PostOutcome, ResourceEntity};
use super::error::FrameworkError;
use super::message::{ObserverChange, ResourceRequest, TickReport};
use crate::model::Representation;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

enum Expectation<T: ResourceEntity> {
    Get(Result<Representation, FrameworkError>),
    Put(Result<Representation, FrameworkError>),
    Post(Result<(PostOutcome<T::Create>, Representation), FrameworkError>),
    Delete(Result<(), FrameworkError>),
    Observe(Result<ObserverChange, FrameworkError>),
    Tick(Result<TickReport, FrameworkError>),
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

fn lock<T: ResourceEntity>(queue: &Queue<T>) -> MutexGuard<'_, VecDeque<Expectation<T>>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MockClient<T: ResourceEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    received: Arc<Mutex<Vec<&'static str>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ResourceEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceEntity> MockClient<T> {
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let queue = expectations.clone();
        let log = received.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&queue).pop_front();
                log.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(label(&request));

                match (request, expectation) {
                    (ResourceRequest::Get { respond_to }, Some(Expectation::Get(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Put { respond_to, .. }, Some(Expectation::Put(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Post { respond_to, .. }, Some(Expectation::Post(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Delete { respond_to }, Some(Expectation::Delete(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Observe { respond_to, .. },
                        Some(Expectation::Observe(response)),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Tick { respond_to }, Some(Expectation::Tick(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (request, _) => {
                        panic!("Unexpected {} request", label(&request));
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            received,
            _handle: handle,
        }
    }

    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_get(&mut self) -> ExpectationBuilder<T, Representation> {
        self.builder(Expectation::Get)
    }

    pub fn expect_put(&mut self) -> ExpectationBuilder<T, Representation> {
        self.builder(Expectation::Put)
    }

    pub fn expect_post(&mut self) -> ExpectationBuilder<T, (PostOutcome<T::Create>, Representation)> {
        self.builder(Expectation::Post)
    }

    pub fn expect_delete(&mut self) -> ExpectationBuilder<T, ()> {
        self.builder(Expectation::Delete)
    }

    pub fn expect_observe(&mut self) -> ExpectationBuilder<T, ObserverChange> {
        self.builder(Expectation::Observe)
    }

    pub fn expect_tick(&mut self) -> ExpectationBuilder<T, TickReport> {
        self.builder(Expectation::Tick)
    }

    fn builder<R>(
        &self,
        wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            expectations: self.expectations.clone(),
            wrap,
        }
    }

    /// Labels of the requests received so far, in order.
    pub fn received(&self) -> Vec<&'static str> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

fn label<T: ResourceEntity>(request: &ResourceRequest<T>) -> &'static str {
    match request {
        ResourceRequest::Get { .. } => "get",
        ResourceRequest::Put { .. } => "put",
        ResourceRequest::Post { .. } => "post",
        ResourceRequest::Delete { .. } => "delete",
        ResourceRequest::Observe { .. } => "observe",
        ResourceRequest::Tick { .. } => "tick",
        ResourceRequest::Snapshot { .. } => "snapshot",
    }
}

pub struct ExpectationBuilder<T: ResourceEntity, R> {
    expectations: Queue<T>,
    wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
}

impl<T: ResourceEntity, R> ExpectationBuilder<T, R> {
    pub fn return_ok(self, value: R) {
        lock(&self.expectations).push_back((self.wrap)(Ok(value)));
    }

    pub fn return_err(self, error: FrameworkError) {
        lock(&self.expectations).push_back((self.wrap)(Err(error)));
    }
}
