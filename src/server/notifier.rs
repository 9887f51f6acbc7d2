//! # Notification Loop
//!
//! Background task started by the first observe registration on a resource.
//! Every tick it advances the entity (`on_tick`) and pushes the new state to
//! observers, either through `notify_all_observers` or to the actor's own
//! observer list.
//!
//! The loop stops when the platform reports no observers or when the resource
//! is gone. It is never restarted from here: a later registration spawns a new
//! instance.
//!
//! Whether a loop is running is tracked in a [`NotifierSlot`] shared with the
//! dispatcher. A registration that finds a loop running marks the slot; the
//! loop checks that mark under the slot lock before it gives up on
//! `NoObservers`, so an observer added while the last notify call was in
//! flight is never left without a loop.

use crate::config::{NotifyMode, ServerConfig};
use crate::framework::{ResourceClient, ResourceEntity};
use crate::model::{EntityResponse, ResourceHandle};
use crate::platform::{PlatformError, ResourcePlatform};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Run state of a resource's notification loop.
#[derive(Debug, Default)]
pub struct NotifierSlot {
    state: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    running: bool,
    /// Set by a registration that found the loop already running.
    rearmed: bool,
    task: Option<JoinHandle<()>>,
}

impl SlotState {
    fn is_live(&self) -> bool {
        self.running && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl NotifierSlot {
    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.state().is_live()
    }

    /// Spawns a loop through `spawn` unless one is live, in which case that
    /// loop is kept from stopping on its next `NoObservers`. Returns true
    /// when a new loop was started.
    pub fn ensure(self: &Arc<Self>, spawn: impl FnOnce(LoopToken) -> JoinHandle<()>) -> bool {
        let mut state = self.state();
        if state.is_live() {
            state.rearmed = true;
            return false;
        }
        state.generation += 1;
        state.running = true;
        state.rearmed = false;
        let token = LoopToken {
            slot: self.clone(),
            generation: state.generation,
        };
        state.task = Some(spawn(token));
        true
    }

    /// Aborts the running loop, if any.
    pub fn stop(&self) {
        let mut state = self.state();
        state.running = false;
        state.rearmed = false;
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }
}

/// A loop's claim on its slot; stale once a newer loop was started.
#[derive(Debug)]
pub struct LoopToken {
    slot: Arc<NotifierSlot>,
    generation: u64,
}

impl LoopToken {
    fn begin_round(&self) {
        let mut state = self.slot.state();
        if state.generation == self.generation {
            state.rearmed = false;
        }
    }

    /// Releases the slot unless a registration arrived since the round began.
    fn try_release(&self) -> bool {
        let mut state = self.slot.state();
        if state.generation != self.generation {
            return true;
        }
        if state.rearmed {
            state.rearmed = false;
            return false;
        }
        state.running = false;
        true
    }

    fn release(&self) {
        let mut state = self.slot.state();
        if state.generation == self.generation {
            state.running = false;
        }
    }
}

pub struct NotificationLoop<T: ResourceEntity> {
    uri: String,
    handle: ResourceHandle,
    client: ResourceClient<T>,
    platform: Arc<dyn ResourcePlatform>,
    interval: Duration,
    mode: NotifyMode,
}

impl<T: ResourceEntity> NotificationLoop<T> {
    pub fn new(
        uri: impl Into<String>,
        handle: ResourceHandle,
        client: ResourceClient<T>,
        platform: Arc<dyn ResourcePlatform>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            uri: uri.into(),
            handle,
            client,
            platform,
            interval: config.notify_interval(),
            mode: config.notify_mode,
        }
    }

    pub fn spawn(self, token: LoopToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }

    async fn run(self, token: LoopToken) {
        let uri = self.uri.as_str();
        info!(
            uri,
            interval_ms = self.interval.as_millis() as u64,
            mode = ?self.mode,
            "Notification loop started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut rounds = 0u64;

        loop {
            ticker.tick().await;
            token.begin_round();

            let report = match self.client.tick().await {
                Ok(report) => report,
                Err(e) if e.is_closed() => {
                    debug!(uri, "Resource actor stopped");
                    token.release();
                    break;
                }
                Err(e) => {
                    warn!(uri, error = %e, "Tick failed");
                    continue;
                }
            };

            let delivered = match self.mode {
                NotifyMode::All => self.platform.notify_all_observers(self.handle).await,
                NotifyMode::ListOfObservers => self.platform.notify_list_of_observers(
                    self.handle,
                    &report.observers,
                    EntityResponse::notification(self.handle, report.representation),
                ),
            };

            match delivered {
                Ok(count) => {
                    rounds += 1;
                    debug!(uri, delivered = count, "Observers notified");
                }
                Err(PlatformError::NoObservers(_)) => {
                    if !token.try_release() {
                        debug!(uri, "Observer registered while stopping");
                        continue;
                    }
                    info!(uri, "No observers left");
                    break;
                }
                Err(PlatformError::UnknownHandle(_)) => {
                    info!(uri, "Resource unregistered");
                    token.release();
                    break;
                }
                Err(e) => warn!(uri, error = %e, "Notification failed"),
            }
        }

        info!(uri, rounds, "Notification loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_task() -> JoinHandle<()> {
        tokio::spawn(std::future::pending())
    }

    #[tokio::test]
    async fn test_second_ensure_rearms_running_loop() {
        let slot = Arc::new(NotifierSlot::default());
        let mut tokens = Vec::new();

        assert!(slot.ensure(|token| {
            tokens.push(token);
            idle_task()
        }));
        assert!(!slot.ensure(|_| unreachable!("loop already running")));
        assert!(slot.is_running());

        let token = &tokens[0];
        assert!(!token.try_release());
        assert!(slot.is_running());
        assert!(token.try_release());
        assert!(!slot.is_running());
        slot.stop();
    }

    #[tokio::test]
    async fn test_new_round_clears_rearm() {
        let slot = Arc::new(NotifierSlot::default());
        let mut tokens = Vec::new();
        slot.ensure(|token| {
            tokens.push(token);
            idle_task()
        });
        slot.ensure(|_| unreachable!("loop already running"));

        tokens[0].begin_round();
        assert!(tokens[0].try_release());
        slot.stop();
    }

    #[tokio::test]
    async fn test_stale_token_leaves_newer_loop_alone() {
        let slot = Arc::new(NotifierSlot::default());
        let mut tokens = Vec::new();
        slot.ensure(|token| {
            tokens.push(token);
            idle_task()
        });
        slot.stop();
        assert!(!slot.is_running());

        assert!(slot.ensure(|token| {
            tokens.push(token);
            idle_task()
        }));
        tokens[0].release();
        assert!(slot.is_running());
        slot.stop();
    }
}
