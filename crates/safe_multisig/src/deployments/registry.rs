use std::collections::BTreeMap;

use alloy_primitives::Address;
use semver::Version;
use serde::{Deserialize, Serialize};

use super::ResolutionError;
use crate::utils::same_release;

const BUNDLED_DEPLOYMENTS: &str = include_str!("deployments.json");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContractKind {
    SafeSingleton,
    SafeL2Singleton,
    ProxyFactory,
    FallbackHandler,
    MultiSendCallOnly,
    SignMessageLib,
}

/// A released contract and the chains it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub contract_name: String,
    pub kind: ContractKind,
    pub version: String,
    #[serde(default = "default_released")]
    pub released: bool,
    /// Keyed by decimal chain id.
    pub network_addresses: BTreeMap<String, Address>,
}

fn default_released() -> bool {
    true
}

impl Deployment {
    pub fn address_on(&self, chain_id: u64) -> Option<Address> {
        self.network_addresses.get(&chain_id.to_string()).copied()
    }

    pub fn is_deployed_on(&self, chain_id: u64) -> bool {
        self.address_on(chain_id).is_some()
    }

    fn parsed_version(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }
}

/// Version and network keyed deployment lookups.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait DeploymentRegistry: Send + Sync {
    /// Finds a released deployment of `kind`.
    ///
    /// `version: None` selects the newest release. `network: None` ignores where the contract
    /// is deployed.
    fn find(
        &self,
        kind: ContractKind,
        version: Option<Version>,
        network: Option<u64>,
    ) -> Option<Deployment>;
}

/// Registry backed by the deployment records compiled into the crate.
#[derive(Debug, Clone, Default)]
pub struct BundledRegistry {
    deployments: Vec<Deployment>,
}

impl BundledRegistry {
    pub fn load() -> Result<Self, ResolutionError> {
        let deployments = serde_json::from_str(BUNDLED_DEPLOYMENTS)
            .map_err(|e| ResolutionError::Registry(e.to_string()))?;
        Ok(Self::from_deployments(deployments))
    }

    pub fn from_deployments(deployments: Vec<Deployment>) -> Self {
        Self { deployments }
    }

    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }
}

impl DeploymentRegistry for BundledRegistry {
    fn find(
        &self,
        kind: ContractKind,
        version: Option<Version>,
        network: Option<u64>,
    ) -> Option<Deployment> {
        let mut candidates = self
            .deployments
            .iter()
            .filter(|d| d.kind == kind && d.released)
            .filter(|d| network.map_or(true, |chain_id| d.is_deployed_on(chain_id)))
            .filter_map(|d| d.parsed_version().map(|v| (v, d)))
            .filter(|(v, _)| version.as_ref().map_or(true, |wanted| same_release(v, wanted)))
            .collect::<Vec<_>>();

        candidates.sort_by(|(a, _), (b, _)| b.cmp(a));
        candidates.into_iter().next().map(|(_, d)| d.clone())
    }
}
