use std::fmt;

/// Stages of the provisioning chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProvisioningStage {
    Init,
    DiscoverUnowned,
    OwnershipTransfer,
    DiscoverOwned,
    PairwiseProvision,
    ProvisionAcl,
    GetLinkedDevices,
    Unlink,
    Revoke,
    Done,
}

impl ProvisioningStage {
    pub const ALL: [ProvisioningStage; 10] = [
        ProvisioningStage::Init,
        ProvisioningStage::DiscoverUnowned,
        ProvisioningStage::OwnershipTransfer,
        ProvisioningStage::DiscoverOwned,
        ProvisioningStage::PairwiseProvision,
        ProvisioningStage::ProvisionAcl,
        ProvisioningStage::GetLinkedDevices,
        ProvisioningStage::Unlink,
        ProvisioningStage::Revoke,
        ProvisioningStage::Done,
    ];

    /// The stage after this one; `None` for [`ProvisioningStage::Done`].
    pub fn next(self) -> Option<Self> {
        let index = Self::ALL.iter().position(|stage| *stage == self)?;
        Self::ALL.get(index + 1).copied()
    }
}

impl fmt::Display for ProvisioningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisioningStage::Init => "INIT",
            ProvisioningStage::DiscoverUnowned => "DISCOVER_UNOWNED",
            ProvisioningStage::OwnershipTransfer => "OWNERSHIP_TRANSFER",
            ProvisioningStage::DiscoverOwned => "DISCOVER_OWNED",
            ProvisioningStage::PairwiseProvision => "PAIRWISE_PROVISION",
            ProvisioningStage::ProvisionAcl => "PROVISION_ACL",
            ProvisioningStage::GetLinkedDevices => "GET_LINKED_DEVICES",
            ProvisioningStage::Unlink => "UNLINK",
            ProvisioningStage::Revoke => "REVOKE",
            ProvisioningStage::Done => "DONE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_walks_the_chain() {
        let mut stage = ProvisioningStage::Init;
        let mut walked = vec![stage];
        while let Some(next) = stage.next() {
            walked.push(next);
            stage = next;
        }
        assert_eq!(walked, ProvisioningStage::ALL.to_vec());
        assert_eq!(ProvisioningStage::Done.next(), None);
    }
}
