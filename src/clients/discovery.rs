//! # Discovery Task
//!
//! Polls the transport for resources of one type and streams every resource
//! not seen before. [`DiscoveryTask::cancel`] stops listening: a poll already
//! in flight is allowed to finish but its results are dropped. Dropping the
//! task (or the receiver) stops it as well.

use super::remote_resource::RemoteResource;
use crate::config::ClientConfig;
use crate::platform::RequestTransport;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct DiscoveryTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<usize>,
}

impl DiscoveryTask {
    /// Starts polling. `resource_type = None` discovers every discoverable resource.
    pub fn start(
        transport: Arc<dyn RequestTransport>,
        resource_type: Option<String>,
        config: &ClientConfig,
    ) -> (Self, mpsc::UnboundedReceiver<RemoteResource>) {
        let (stop, stopped) = watch::channel(false);
        let (found, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(poll(
            transport,
            resource_type,
            config.discovery_interval(),
            stopped,
            found,
        ));
        (Self { stop, handle }, receiver)
    }

    /// Stops listening for further results.
    pub fn cancel(&self) {
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task to end and returns how many resources it reported.
    pub async fn join(self) -> usize {
        match self.handle.await {
            Ok(reported) => reported,
            Err(e) => {
                warn!(error = %e, "Discovery task failed");
                0
            }
        }
    }
}

async fn poll(
    transport: Arc<dyn RequestTransport>,
    resource_type: Option<String>,
    interval: Duration,
    mut stopped: watch::Receiver<bool>,
    found: mpsc::UnboundedSender<RemoteResource>,
) -> usize {
    let mut seen = HashSet::new();
    let mut ticker = tokio::time::interval(interval);
    info!(resource_type = ?resource_type, "Discovery started");

    loop {
        tokio::select! {
            _ = stopped.changed() => break,
            _ = ticker.tick() => {
                let descriptors = transport.find_resources(resource_type.as_deref()).await;
                if *stopped.borrow() {
                    debug!(dropped = descriptors.len(), "Discovery cancelled during poll");
                    break;
                }
                for descriptor in descriptors {
                    if !seen.insert(descriptor.uri.clone()) {
                        continue;
                    }
                    debug!(uri = %descriptor.uri, "Resource discovered");
                    if found.send(RemoteResource::new(descriptor, transport.clone())).is_err() {
                        info!(reported = seen.len(), "Discovery receiver dropped");
                        return seen.len();
                    }
                }
            }
        }
    }

    info!(reported = seen.len(), "Discovery stopped");
    seen.len()
}
