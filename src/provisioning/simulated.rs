//! In-process provisioning backend used by the `provision` command and tests.
//!
//! Devices live in a map; ownership, links and ACLs are plain flags. Any call
//! can be made to fail with a chosen code, and devices can be made to report
//! "not ready" for a number of polls after ownership transfer.

use super::backend::{BackendError, Completion, DeviceInfo, ProvisioningBackend};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Completion code for a device the network does not know.
pub const UNKNOWN_DEVICE: i32 = 404;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCall {
    DiscoverUnowned,
    TransferOwnership,
    IsReady,
    DiscoverOwned,
    ProvisionPairwise,
    ProvisionAcl,
    GetLinkedDevices,
    Unlink,
    RemoveDevice,
}

#[derive(Debug, Default)]
struct SimDevice {
    owned: bool,
    polls_until_ready: u32,
    acl: bool,
    links: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct State {
    devices: BTreeMap<String, SimDevice>,
    failures: HashMap<BackendCall, i32>,
    ready_after: u32,
    calls: Vec<BackendCall>,
}

#[derive(Debug, Default)]
pub struct SimulatedNetwork {
    state: Mutex<State>,
    latency: Duration,
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A network with `count` unowned devices named `device-1`..`device-N`.
    pub fn with_unowned(count: usize) -> Self {
        let network = Self::new();
        for n in 1..=count {
            network.add_device(format!("device-{}", n), false);
        }
        network
    }

    /// Delay applied to every call before it completes.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_device(&self, device_id: impl Into<String>, owned: bool) {
        self.state().devices.insert(
            device_id.into(),
            SimDevice {
                owned,
                ..SimDevice::default()
            },
        );
    }

    /// Every later `call` completes with `code`.
    pub fn fail_on(&self, call: BackendCall, code: i32) {
        self.state().failures.insert(call, code);
    }

    /// Devices report not ready for `polls` polls after ownership transfer.
    pub fn ready_after(&self, polls: u32) {
        self.state().ready_after = polls;
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.clone()
    }

    pub fn count(&self, call: BackendCall) -> usize {
        self.state().calls.iter().filter(|c| **c == call).count()
    }

    pub fn is_owned(&self, device_id: &str) -> bool {
        self.state()
            .devices
            .get(device_id)
            .is_some_and(|device| device.owned)
    }

    pub fn has_acl(&self, device_id: &str) -> bool {
        self.state()
            .devices
            .get(device_id)
            .is_some_and(|device| device.acl)
    }

    pub fn links(&self, device_id: &str) -> Vec<String> {
        self.state()
            .devices
            .get(device_id)
            .map(|device| device.links.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.state().devices.contains_key(device_id)
    }

    /// Logs the call, waits out the latency and applies the failure injection.
    async fn begin(&self, call: BackendCall) -> Completion<()> {
        let failure = {
            let mut state = self.state();
            state.calls.push(call);
            state.failures.get(&call).copied()
        };
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match failure {
            Some(code) => Err(BackendError::new(code, format!("{:?} failed", call))),
            None => Ok(()),
        }
    }

    fn with_device<R>(
        &self,
        device_id: &str,
        apply: impl FnOnce(&mut SimDevice) -> R,
    ) -> Completion<R> {
        let mut state = self.state();
        let device = state
            .devices
            .get_mut(device_id)
            .ok_or_else(|| BackendError::new(UNKNOWN_DEVICE, format!("unknown device {}", device_id)))?;
        Ok(apply(device))
    }

    fn list(&self, owned: bool) -> Vec<DeviceInfo> {
        self.state()
            .devices
            .iter()
            .filter(|(_, device)| device.owned == owned)
            .map(|(id, _)| DeviceInfo::new(id.as_str(), owned))
            .collect()
    }
}

#[async_trait]
impl ProvisioningBackend for SimulatedNetwork {
    async fn discover_unowned(&self, _timeout: Duration) -> Completion<Vec<DeviceInfo>> {
        self.begin(BackendCall::DiscoverUnowned).await?;
        Ok(self.list(false))
    }

    async fn transfer_ownership(&self, device: &DeviceInfo) -> Completion<()> {
        self.begin(BackendCall::TransferOwnership).await?;
        let ready_after = self.state().ready_after;
        self.with_device(&device.device_id, |d| {
            d.owned = true;
            d.polls_until_ready = ready_after;
        })
    }

    async fn is_ready(&self, device: &DeviceInfo) -> Completion<bool> {
        self.begin(BackendCall::IsReady).await?;
        self.with_device(&device.device_id, |d| {
            if d.polls_until_ready == 0 {
                true
            } else {
                d.polls_until_ready -= 1;
                false
            }
        })
    }

    async fn discover_owned(&self, _timeout: Duration) -> Completion<Vec<DeviceInfo>> {
        self.begin(BackendCall::DiscoverOwned).await?;
        Ok(self.list(true))
    }

    async fn provision_pairwise(&self, first: &DeviceInfo, second: &DeviceInfo) -> Completion<()> {
        self.begin(BackendCall::ProvisionPairwise).await?;
        let second_id = second.device_id.clone();
        self.with_device(&first.device_id, |d| {
            d.links.insert(second_id);
        })?;
        let first_id = first.device_id.clone();
        self.with_device(&second.device_id, |d| {
            d.links.insert(first_id);
        })
    }

    async fn provision_acl(&self, device: &DeviceInfo) -> Completion<()> {
        self.begin(BackendCall::ProvisionAcl).await?;
        self.with_device(&device.device_id, |d| d.acl = true)
    }

    async fn get_linked_devices(&self, device: &DeviceInfo) -> Completion<Vec<String>> {
        self.begin(BackendCall::GetLinkedDevices).await?;
        self.with_device(&device.device_id, |d| d.links.iter().cloned().collect())
    }

    async fn unlink(&self, device: &DeviceInfo, peer: &str) -> Completion<()> {
        self.begin(BackendCall::Unlink).await?;
        self.with_device(&device.device_id, |d| {
            d.links.remove(peer);
        })?;
        let device_id = device.device_id.clone();
        self.with_device(peer, |d| {
            d.links.remove(&device_id);
        })
    }

    async fn remove_device(&self, device: &DeviceInfo, _timeout: Duration) -> Completion<()> {
        self.begin(BackendCall::RemoveDevice).await?;
        let mut state = self.state();
        if state.devices.remove(&device.device_id).is_none() {
            return Err(BackendError::new(
                UNKNOWN_DEVICE,
                format!("unknown device {}", device.device_id),
            ));
        }
        for other in state.devices.values_mut() {
            other.links.remove(&device.device_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pairwise_links_both_ways_and_unlink_removes_both() {
        let network = SimulatedNetwork::new();
        network.add_device("a", true);
        network.add_device("b", true);
        let a = DeviceInfo::new("a", true);
        let b = DeviceInfo::new("b", true);

        network.provision_pairwise(&a, &b).await.unwrap();
        assert_eq!(network.links("a"), vec!["b".to_string()]);
        assert_eq!(network.links("b"), vec!["a".to_string()]);

        network.unlink(&a, "b").await.unwrap();
        assert!(network.links("a").is_empty());
        assert!(network.links("b").is_empty());
    }

    #[tokio::test]
    async fn test_ready_after_counts_down_polls() {
        let network = SimulatedNetwork::with_unowned(1);
        network.ready_after(2);
        let device = DeviceInfo::new("device-1", false);

        network.transfer_ownership(&device).await.unwrap();
        assert!(network.is_owned("device-1"));
        assert!(!network.is_ready(&device).await.unwrap());
        assert!(!network.is_ready(&device).await.unwrap());
        assert!(network.is_ready(&device).await.unwrap());
        assert_eq!(network.count(BackendCall::IsReady), 3);
    }

    #[tokio::test]
    async fn test_failure_injection_and_unknown_device() {
        let network = SimulatedNetwork::with_unowned(2);
        network.fail_on(BackendCall::DiscoverUnowned, 7);

        let err = network.discover_unowned(Duration::from_millis(10)).await.unwrap_err();
        assert_eq!(err.code, 7);

        let err = network
            .provision_acl(&DeviceInfo::new("ghost", true))
            .await
            .unwrap_err();
        assert_eq!(err.code, UNKNOWN_DEVICE);
        assert_eq!(
            network.calls(),
            vec![BackendCall::DiscoverUnowned, BackendCall::ProvisionAcl]
        );
    }

    #[tokio::test]
    async fn test_remove_device_drops_peer_links() {
        let network = SimulatedNetwork::new();
        network.add_device("a", true);
        network.add_device("b", true);
        let a = DeviceInfo::new("a", true);
        network
            .provision_pairwise(&a, &DeviceInfo::new("b", true))
            .await
            .unwrap();

        network.remove_device(&a, Duration::from_millis(10)).await.unwrap();
        assert!(!network.contains("a"));
        assert!(network.links("b").is_empty());
        assert!(network.remove_device(&a, Duration::from_millis(10)).await.is_err());
    }
}
