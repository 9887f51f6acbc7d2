use oic_resource::config::ProvisioningConfig;
use oic_resource::provisioning::{
    BackendCall, ProvisioningClient, ProvisioningError, ProvisioningStage, SimulatedNetwork,
};
use std::sync::Arc;
use std::time::Duration;

fn config() -> ProvisioningConfig {
    ProvisioningConfig {
        discovery_timeout_ms: 100,
        readiness_poll_interval_ms: 5,
        readiness_timeout_ms: 500,
    }
}

#[tokio::test]
async fn test_full_run_visits_every_stage_in_order() {
    let network = Arc::new(SimulatedNetwork::with_unowned(2));
    network.ready_after(2);
    let mut client = ProvisioningClient::new(network.clone(), config());

    let report = client.run().await.unwrap();

    assert_eq!(report.visited, ProvisioningStage::ALL.to_vec());
    assert!(report.skipped.is_empty());
    assert_eq!(client.stage(), ProvisioningStage::Done);
    assert_eq!(report.onboarded, vec!["device-1", "device-2"]);
    assert_eq!(report.owned, vec!["device-1", "device-2"]);
    assert_eq!(report.linked, vec!["device-2"]);

    assert_eq!(network.count(BackendCall::TransferOwnership), 2);
    assert_eq!(network.count(BackendCall::ProvisionAcl), 2);
    assert_eq!(network.count(BackendCall::ProvisionPairwise), 1);
    assert!(network.count(BackendCall::IsReady) >= 6);
    assert!(network.has_acl("device-2"));
    assert!(network.links("device-2").is_empty());
    assert!(!network.contains("device-1"));
}

#[tokio::test]
async fn test_failure_halts_at_its_stage() {
    let network = Arc::new(SimulatedNetwork::with_unowned(2));
    network.fail_on(BackendCall::ProvisionPairwise, 42);
    let mut client = ProvisioningClient::new(network.clone(), config());

    let err = client.run().await.unwrap_err();

    assert!(matches!(
        err,
        ProvisioningError::StageFailed {
            stage: ProvisioningStage::PairwiseProvision,
            ..
        }
    ));
    assert_eq!(err.code(), Some(42));
    assert_eq!(client.stage(), ProvisioningStage::PairwiseProvision);
    assert_eq!(
        client.history().last(),
        Some(&ProvisioningStage::PairwiseProvision)
    );
    assert_eq!(network.count(BackendCall::ProvisionAcl), 0);
    assert_eq!(network.count(BackendCall::RemoveDevice), 0);
}

#[tokio::test]
async fn test_no_unowned_devices_skips_ownership_transfer() {
    let network = Arc::new(SimulatedNetwork::new());
    network.add_device("owned-1", true);
    let mut client = ProvisioningClient::new(network.clone(), config());

    let report = client.run().await.unwrap();

    assert_eq!(report.visited, ProvisioningStage::ALL.to_vec());
    assert_eq!(network.count(BackendCall::TransferOwnership), 0);
    assert_eq!(network.count(BackendCall::IsReady), 0);
    assert!(report.onboarded.is_empty());
    assert_eq!(
        report.skipped,
        vec![
            ProvisioningStage::OwnershipTransfer,
            ProvisioningStage::PairwiseProvision,
            ProvisioningStage::Unlink,
        ]
    );
    assert_eq!(network.count(BackendCall::RemoveDevice), 1);
}

#[tokio::test]
async fn test_empty_network_only_discovers() {
    let network = Arc::new(SimulatedNetwork::new());
    let mut client = ProvisioningClient::new(network.clone(), config());

    let report = client.run().await.unwrap();

    assert_eq!(
        network.calls(),
        vec![BackendCall::DiscoverUnowned, BackendCall::DiscoverOwned]
    );
    assert_eq!(report.skipped.len(), 6);
    assert_eq!(client.stage(), ProvisioningStage::Done);
}

#[tokio::test]
async fn test_discovery_failure_halts_before_any_device_call() {
    let network = Arc::new(SimulatedNetwork::with_unowned(3));
    network.fail_on(BackendCall::DiscoverUnowned, 5);
    let mut client = ProvisioningClient::new(network.clone(), config());

    let err = client.run().await.unwrap_err();

    assert_eq!(err.code(), Some(5));
    assert_eq!(client.stage(), ProvisioningStage::DiscoverUnowned);
    assert_eq!(network.calls(), vec![BackendCall::DiscoverUnowned]);
}

#[tokio::test]
async fn test_slow_devices_are_onboarded_concurrently() {
    let network = Arc::new(SimulatedNetwork::with_unowned(3).with_latency(Duration::from_millis(40)));
    let mut client = ProvisioningClient::new(network.clone(), config());

    let report = client.run().await.unwrap();

    assert_eq!(report.onboarded, vec!["device-1", "device-2", "device-3"]);
    // Every transfer is issued before the first readiness poll comes back.
    assert_eq!(
        network.calls()[..4],
        [
            BackendCall::DiscoverUnowned,
            BackendCall::TransferOwnership,
            BackendCall::TransferOwnership,
            BackendCall::TransferOwnership,
        ]
    );
    assert_eq!(client.stage(), ProvisioningStage::Done);
}
