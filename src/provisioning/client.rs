//! # Provisioning Client
//!
//! Drives the chain
//!
//! ```text
//! INIT -> DISCOVER_UNOWNED -> OWNERSHIP_TRANSFER -> DISCOVER_OWNED -> PAIRWISE_PROVISION
//!      -> PROVISION_ACL -> GET_LINKED_DEVICES -> UNLINK -> REVOKE -> DONE
//! ```
//!
//! Each stage starts only after the previous one completed. Fan-out stages
//! (ownership transfer, ACL provisioning) issue one call per device and
//! complete once every per-device completion has arrived. A stage with no
//! eligible device is skipped without calling the backend. The first nonzero
//! completion halts the chain at its stage; nothing is retried or rolled back.
//!
//! After ownership transfer each device is polled with `is_ready` until it
//! reports ready or the readiness timeout runs out.

use super::backend::{BackendError, DeviceInfo, ProvisioningBackend};
use super::error::ProvisioningError;
use super::stage::ProvisioningStage;
use crate::config::ProvisioningConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisioningReport {
    /// Every stage entered, in order.
    pub visited: Vec<ProvisioningStage>,
    /// Stages entered but short-circuited for lack of eligible devices.
    pub skipped: Vec<ProvisioningStage>,
    /// Devices onboarded during this run.
    pub onboarded: Vec<String>,
    /// Owned devices found after onboarding.
    pub owned: Vec<String>,
    /// Devices linked to the first owned device before unlinking.
    pub linked: Vec<String>,
}

pub struct ProvisioningClient {
    backend: Arc<dyn ProvisioningBackend>,
    config: ProvisioningConfig,
    stage: ProvisioningStage,
    report: ProvisioningReport,
}

impl ProvisioningClient {
    pub fn new(backend: Arc<dyn ProvisioningBackend>, config: ProvisioningConfig) -> Self {
        Self {
            backend,
            config,
            stage: ProvisioningStage::Init,
            report: ProvisioningReport::default(),
        }
    }

    /// Current stage; after a failed run this is the stage that halted.
    pub fn stage(&self) -> ProvisioningStage {
        self.stage
    }

    /// Stages entered so far.
    pub fn history(&self) -> &[ProvisioningStage] {
        &self.report.visited
    }

    fn enter(&mut self, stage: ProvisioningStage) {
        self.stage = stage;
        self.report.visited.push(stage);
        info!(%stage, "Entering stage");
    }

    fn skip(&mut self, reason: &str) {
        info!(stage = %self.stage, reason, "Stage skipped");
        self.report.skipped.push(self.stage);
    }

    fn failed(&self, device: &str) -> impl FnOnce(BackendError) -> ProvisioningError {
        let stage = self.stage;
        let device = device.to_string();
        move |source| {
            warn!(%stage, %device, code = source.code, error = %source.message, "Stage failed");
            ProvisioningError::StageFailed {
                stage,
                device,
                source,
            }
        }
    }

    /// Runs the chain to `DONE` or to the first failure.
    #[tracing::instrument(skip(self))]
    pub async fn run(&mut self) -> Result<ProvisioningReport, ProvisioningError> {
        let timeout = self.config.discovery_timeout();
        self.enter(ProvisioningStage::Init);

        self.enter(ProvisioningStage::DiscoverUnowned);
        let unowned = self
            .backend
            .discover_unowned(timeout)
            .await
            .map_err(self.failed("*"))?;
        info!(count = unowned.len(), "Unowned devices discovered");

        self.enter(ProvisioningStage::OwnershipTransfer);
        if unowned.is_empty() {
            self.skip("no unowned devices");
        } else {
            let interval = self.config.readiness_poll_interval();
            let readiness_timeout = self.config.readiness_timeout();
            self.fan_out(&unowned, move |backend, device| async move {
                backend
                    .transfer_ownership(&device)
                    .await
                    .map_err(|source| ProvisioningError::StageFailed {
                        stage: ProvisioningStage::OwnershipTransfer,
                        device: device.device_id.clone(),
                        source,
                    })?;
                wait_ready(backend.as_ref(), &device, interval, readiness_timeout).await
            })
            .await?;
            self.report.onboarded = unowned.iter().map(|d| d.device_id.clone()).collect();
        }

        self.enter(ProvisioningStage::DiscoverOwned);
        let owned = self
            .backend
            .discover_owned(timeout)
            .await
            .map_err(self.failed("*"))?;
        self.report.owned = owned.iter().map(|d| d.device_id.clone()).collect();
        info!(count = owned.len(), "Owned devices discovered");

        self.enter(ProvisioningStage::PairwiseProvision);
        match owned.as_slice() {
            [first, second, ..] => {
                self.backend
                    .provision_pairwise(first, second)
                    .await
                    .map_err(self.failed(&first.device_id))?;
            }
            _ => self.skip("fewer than two owned devices"),
        }

        self.enter(ProvisioningStage::ProvisionAcl);
        if owned.is_empty() {
            self.skip("no owned devices");
        } else {
            self.fan_out(&owned, |backend, device| async move {
                backend
                    .provision_acl(&device)
                    .await
                    .map_err(|source| ProvisioningError::StageFailed {
                        stage: ProvisioningStage::ProvisionAcl,
                        device: device.device_id.clone(),
                        source,
                    })
            })
            .await?;
        }

        let target = owned.first();

        self.enter(ProvisioningStage::GetLinkedDevices);
        match target {
            Some(device) => {
                self.report.linked = self
                    .backend
                    .get_linked_devices(device)
                    .await
                    .map_err(self.failed(&device.device_id))?;
                info!(device = %device.device_id, linked = ?self.report.linked, "Linked devices");
            }
            None => self.skip("no owned devices"),
        }

        self.enter(ProvisioningStage::Unlink);
        match (target, self.report.linked.first().cloned()) {
            (Some(device), Some(peer)) => {
                self.backend
                    .unlink(device, &peer)
                    .await
                    .map_err(self.failed(&device.device_id))?;
            }
            _ => self.skip("no linked peer"),
        }

        self.enter(ProvisioningStage::Revoke);
        match target {
            Some(device) => {
                self.backend
                    .remove_device(device, timeout)
                    .await
                    .map_err(self.failed(&device.device_id))?;
            }
            None => self.skip("no owned devices"),
        }

        self.enter(ProvisioningStage::Done);
        Ok(self.report.clone())
    }

    /// One call per device; completes after every completion has arrived.
    async fn fan_out<F, Fut>(&self, devices: &[DeviceInfo], call: F) -> Result<(), ProvisioningError>
    where
        F: Fn(Arc<dyn ProvisioningBackend>, DeviceInfo) -> Fut,
        Fut: Future<Output = Result<(), ProvisioningError>> + Send + 'static,
    {
        let stage = self.stage;
        let mut tasks = JoinSet::new();
        for device in devices {
            tasks.spawn(call(self.backend.clone(), device.clone()));
        }

        let mut pending = tasks.len();
        let mut first_failure = None;
        while let Some(joined) = tasks.join_next().await {
            pending -= 1;
            let outcome = joined.unwrap_or_else(|e| {
                Err(ProvisioningError::TaskAborted {
                    stage,
                    message: e.to_string(),
                })
            });
            match outcome {
                Ok(()) => debug!(%stage, pending, "Completion received"),
                Err(e) => {
                    warn!(%stage, pending, error = %e, "Completion failed");
                    first_failure.get_or_insert(e);
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn wait_ready(
    backend: &dyn ProvisioningBackend,
    device: &DeviceInfo,
    interval: Duration,
    timeout: Duration,
) -> Result<(), ProvisioningError> {
    let started = Instant::now();
    loop {
        let ready = backend
            .is_ready(device)
            .await
            .map_err(|source| ProvisioningError::StageFailed {
                stage: ProvisioningStage::OwnershipTransfer,
                device: device.device_id.clone(),
                source,
            })?;
        if ready {
            debug!(device = %device.device_id, waited_ms = started.elapsed().as_millis() as u64, "Device ready");
            return Ok(());
        }
        if started.elapsed() + interval > timeout {
            return Err(ProvisioningError::NotReady {
                device: device.device_id.clone(),
                waited_ms: started.elapsed().as_millis() as u64,
            });
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::simulated::{BackendCall, SimulatedNetwork};

    fn fast_config() -> ProvisioningConfig {
        ProvisioningConfig {
            discovery_timeout_ms: 50,
            readiness_poll_interval_ms: 5,
            readiness_timeout_ms: 40,
        }
    }

    #[tokio::test]
    async fn test_readiness_timeout_halts_in_ownership_transfer() {
        let network = Arc::new(SimulatedNetwork::with_unowned(1));
        network.ready_after(1_000);
        let mut client = ProvisioningClient::new(network.clone(), fast_config());

        let err = client.run().await.unwrap_err();
        assert!(matches!(err, ProvisioningError::NotReady { ref device, .. } if device == "device-1"));
        assert_eq!(client.stage(), ProvisioningStage::OwnershipTransfer);
        assert_eq!(network.count(BackendCall::DiscoverOwned), 0);
    }

    #[tokio::test]
    async fn test_fan_out_waits_for_every_device_before_failing() {
        let network = Arc::new(SimulatedNetwork::with_unowned(3));
        network.fail_on(BackendCall::TransferOwnership, 12);
        let mut client = ProvisioningClient::new(network.clone(), fast_config());

        let err = client.run().await.unwrap_err();
        assert_eq!(err.code(), Some(12));
        assert_eq!(network.count(BackendCall::TransferOwnership), 3);
        assert_eq!(network.count(BackendCall::IsReady), 0);
    }
}
