//! Resolution of the versioned contracts a safe depends on on a given chain.

use std::sync::Arc;

use alloy_primitives::Address;
use semver::{Version, VersionReq};
use tracing::{debug, trace};

use crate::{config::ChainConfig, consts, store::KeyedStore, utils::parse_safe_version};

pub mod registry;

pub use registry::{BundledRegistry, ContractKind, Deployment, DeploymentRegistry};

#[cfg(any(test, feature = "mock"))]
pub use registry::MockDeploymentRegistry;

/// First version that ships a singleton variant optimised for L2 chains.
const L2_SINGLETON_VERSION: &str = ">=1.3.0";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("{kind} {version} is not supported on chain {chain_id}")]
    UnsupportedVersion { kind: ContractKind, version: String, chain_id: u64 },

    #[error("{kind} contract not found for chain id {chain_id}")]
    ContractNotFound { kind: ContractKind, chain_id: u64 },

    #[error("invalid safe version {0:?}")]
    InvalidVersion(String),

    #[error("deployment registry unavailable: {0}")]
    Registry(String),
}

/// Master copies resolved per chain, reset with the process.
pub type DeploymentCache = KeyedStore<u64, Arc<WalletDeployment>>;

/// Contracts resolved for one (chain, safe version) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletDeployment {
    pub chain_id: u64,
    pub safe_version: Version,
    pub uses_l2_singleton: bool,
    /// The safe predates the earliest release with its own deployment.
    pub predates_supported: bool,
    pub singleton: Deployment,
    pub proxy_factory: Deployment,
    pub fallback_handler: Deployment,
    pub multi_send: Deployment,
    pub sign_message_lib: Deployment,
}

impl WalletDeployment {
    fn address_of(&self, deployment: &Deployment) -> Result<Address, ResolutionError> {
        deployment.address_on(self.chain_id).ok_or(ResolutionError::ContractNotFound {
            kind: deployment.kind,
            chain_id: self.chain_id,
        })
    }

    pub fn singleton_address(&self) -> Result<Address, ResolutionError> {
        self.address_of(&self.singleton)
    }

    pub fn proxy_factory_address(&self) -> Result<Address, ResolutionError> {
        self.address_of(&self.proxy_factory)
    }

    pub fn fallback_handler_address(&self) -> Result<Address, ResolutionError> {
        self.address_of(&self.fallback_handler)
    }

    pub fn multi_send_address(&self) -> Result<Address, ResolutionError> {
        self.address_of(&self.multi_send)
    }

    pub fn sign_message_lib_address(&self) -> Result<Address, ResolutionError> {
        self.address_of(&self.sign_message_lib)
    }
}

#[derive(Debug)]
pub struct DeploymentResolver<R> {
    registry: R,
    latest_version: Version,
    earliest_supported: Version,
    cache: Arc<DeploymentCache>,
}

impl DeploymentResolver<BundledRegistry> {
    /// Resolver over the bundled registry, `latest_version` taken from config.
    pub fn bundled(latest_version: &str) -> Result<Self, ResolutionError> {
        Self::new(BundledRegistry::load()?, latest_version)
    }
}

impl<R: DeploymentRegistry> DeploymentResolver<R> {
    pub fn new(registry: R, latest_version: &str) -> Result<Self, ResolutionError> {
        Ok(Self {
            registry,
            latest_version: parse(latest_version)?,
            earliest_supported: parse(consts::EARLIEST_SUPPORTED_SAFE_VERSION)?,
            cache: Default::default(),
        })
    }

    /// Shares `cache` with other resolvers instead of the private one.
    pub fn with_cache(mut self, cache: Arc<DeploymentCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<DeploymentCache> {
        &self.cache
    }

    pub fn latest_version(&self) -> &Version {
        &self.latest_version
    }

    /// Singleton deployment a safe of `safe_version` runs on.
    ///
    /// Lookup order is (version, chain), then (version), then the earliest supported release for
    /// safes that predate it.
    pub fn safe_singleton(
        &self,
        safe_version: &str,
        chain: &ChainConfig,
    ) -> Result<Deployment, ResolutionError> {
        let version = parse(safe_version)?;
        let kind = self.singleton_kind(&version, chain);

        if let Some(deployment) = self.versioned(kind, &version, chain.chain_id) {
            return Ok(deployment);
        }

        if self.predates_supported(&version) {
            debug!(target: "safe::deployments", %version, floor = %self.earliest_supported, chain_id = chain.chain_id, "Falling back to earliest supported singleton");

            if let Some(deployment) =
                self.registry.find(kind, Some(self.earliest_supported.clone()), None)
            {
                return Ok(deployment);
            }
        }

        Err(ResolutionError::UnsupportedVersion {
            kind,
            version: safe_version.to_string(),
            chain_id: chain.chain_id,
        })
    }

    pub fn proxy_factory(&self, chain: &ChainConfig) -> Result<Deployment, ResolutionError> {
        self.latest_versioned(ContractKind::ProxyFactory, chain.chain_id)
    }

    pub fn fallback_handler(&self, chain: &ChainConfig) -> Result<Deployment, ResolutionError> {
        self.latest_versioned(ContractKind::FallbackHandler, chain.chain_id)
    }

    pub fn multi_send(&self, chain: &ChainConfig) -> Result<Deployment, ResolutionError> {
        self.newest(ContractKind::MultiSendCallOnly, chain.chain_id)
    }

    pub fn sign_message_lib(&self, chain: &ChainConfig) -> Result<Deployment, ResolutionError> {
        self.newest(ContractKind::SignMessageLib, chain.chain_id)
    }

    /// Resolves every contract for a safe of `safe_version` on `chain`.
    pub fn resolve(
        &self,
        safe_version: &str,
        chain: &ChainConfig,
    ) -> Result<WalletDeployment, ResolutionError> {
        let version = parse(safe_version)?;

        let deployment = WalletDeployment {
            chain_id: chain.chain_id,
            uses_l2_singleton: self.singleton_kind(&version, chain) == ContractKind::SafeL2Singleton,
            predates_supported: self.predates_supported(&version),
            singleton: self.safe_singleton(safe_version, chain)?,
            proxy_factory: self.proxy_factory(chain)?,
            fallback_handler: self.fallback_handler(chain)?,
            multi_send: self.multi_send(chain)?,
            sign_message_lib: self.sign_message_lib(chain)?,
            safe_version: version,
        };

        trace!(target: "safe::deployments", chain_id = chain.chain_id, version = %deployment.safe_version, singleton = %deployment.singleton.version, l2 = deployment.uses_l2_singleton, "Resolved deployment");

        Ok(deployment)
    }

    /// Master copies of the latest version for `chain`, resolved once per chain.
    ///
    /// Fails unless the singleton, proxy factory, fallback handler and multi send all live on the
    /// chain.
    pub fn master_contracts(
        &self,
        chain: &ChainConfig,
    ) -> Result<Arc<WalletDeployment>, ResolutionError> {
        self.cache.get_or_try_insert_with(chain.chain_id, || {
            let deployment = self.resolve(&self.latest_version.to_string(), chain)?;

            deployment.singleton_address()?;
            deployment.proxy_factory_address()?;
            deployment.fallback_handler_address()?;
            deployment.multi_send_address()?;

            debug!(target: "safe::deployments", chain_id = chain.chain_id, version = %deployment.safe_version, "Cached master contracts");

            Ok(Arc::new(deployment))
        })
    }

    fn singleton_kind(&self, version: &Version, chain: &ChainConfig) -> ContractKind {
        let l2_capable = VersionReq::parse(L2_SINGLETON_VERSION)
            .map(|req| req.matches(version))
            .unwrap_or(false);

        if chain.l2 && l2_capable {
            ContractKind::SafeL2Singleton
        } else {
            ContractKind::SafeSingleton
        }
    }

    fn predates_supported(&self, version: &Version) -> bool {
        *version < self.earliest_supported
    }

    fn versioned(&self, kind: ContractKind, version: &Version, chain_id: u64) -> Option<Deployment> {
        self.registry
            .find(kind, Some(version.clone()), Some(chain_id))
            .or_else(|| self.registry.find(kind, Some(version.clone()), None))
    }

    fn latest_versioned(
        &self,
        kind: ContractKind,
        chain_id: u64,
    ) -> Result<Deployment, ResolutionError> {
        self.versioned(kind, &self.latest_version, chain_id)
            .ok_or(ResolutionError::ContractNotFound { kind, chain_id })
    }

    fn newest(&self, kind: ContractKind, chain_id: u64) -> Result<Deployment, ResolutionError> {
        self.registry
            .find(kind, None, Some(chain_id))
            .or_else(|| self.registry.find(kind, None, None))
            .ok_or(ResolutionError::ContractNotFound { kind, chain_id })
    }
}

fn parse(version: &str) -> Result<Version, ResolutionError> {
    parse_safe_version(version).map_err(|_| ResolutionError::InvalidVersion(version.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use mockall::{predicate::eq, Sequence};

    fn chain(chain_id: u64, l2: bool) -> ChainConfig {
        ChainConfig {
            chain_id,
            name: format!("chain-{chain_id}"),
            l2,
            rpc_url: None,
            transaction_service_url: None,
        }
    }

    fn record(kind: ContractKind, version: &str) -> Deployment {
        Deployment {
            contract_name: "GnosisSafe".to_string(),
            kind,
            version: version.to_string(),
            released: true,
            network_addresses: BTreeMap::from([("1".to_string(), Address::repeat_byte(0x10))]),
        }
    }

    fn v(s: &str) -> Option<Version> {
        Some(Version::parse(s).unwrap())
    }

    #[test]
    fn pre_v1_falls_back_to_network_agnostic_then_floor() {
        let mut registry = MockDeploymentRegistry::new();
        let mut seq = Sequence::new();

        registry
            .expect_find()
            .with(eq(ContractKind::SafeSingleton), eq(v("0.9.0")), eq(Some(4)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| None);
        registry
            .expect_find()
            .with(eq(ContractKind::SafeSingleton), eq(v("0.9.0")), eq(None))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| None);
        registry
            .expect_find()
            .with(eq(ContractKind::SafeSingleton), eq(v("1.0.0")), eq(None))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Some(record(ContractKind::SafeSingleton, "1.0.0")));

        let resolver = DeploymentResolver::new(registry, "1.3.0").unwrap();
        let singleton = resolver.safe_singleton("0.9.0", &chain(4, false)).unwrap();

        assert_eq!(singleton.version, "1.0.0");
    }

    #[test]
    fn network_agnostic_match_wins_over_floor() {
        let mut registry = MockDeploymentRegistry::new();
        registry
            .expect_find()
            .with(eq(ContractKind::SafeSingleton), eq(v("0.9.0")), eq(Some(4)))
            .returning(|_, _, _| None);
        registry
            .expect_find()
            .with(eq(ContractKind::SafeSingleton), eq(v("0.9.0")), eq(None))
            .returning(|_, _, _| Some(record(ContractKind::SafeSingleton, "0.9.0")));

        let resolver = DeploymentResolver::new(registry, "1.3.0").unwrap();
        let singleton = resolver.safe_singleton("0.9.0", &chain(4, false)).unwrap();

        assert_eq!(singleton.version, "0.9.0");
    }

    #[test]
    fn pre_v1_fails_when_floor_is_missing() {
        let mut registry = MockDeploymentRegistry::new();
        registry.expect_find().times(3).returning(|_, _, _| None);

        let resolver = DeploymentResolver::new(registry, "1.3.0").unwrap();
        let err = resolver.safe_singleton("0.9.0", &chain(4, false)).unwrap_err();

        assert!(matches!(err, ResolutionError::UnsupportedVersion { chain_id: 4, .. }));
    }

    #[test]
    fn supported_versions_never_use_floor() {
        let mut registry = MockDeploymentRegistry::new();
        registry.expect_find().times(2).returning(|_, _, _| None);

        let resolver = DeploymentResolver::new(registry, "1.3.0").unwrap();
        let err = resolver.safe_singleton("1.1.0", &chain(1, false)).unwrap_err();

        assert_eq!(
            err,
            ResolutionError::UnsupportedVersion {
                kind: ContractKind::SafeSingleton,
                version: "1.1.0".to_string(),
                chain_id: 1,
            }
        );
    }

    #[test]
    fn l2_singleton_only_from_v130_on_l2_chains() {
        let resolver = DeploymentResolver::bundled("1.3.0").unwrap();

        let l2 = resolver.resolve("1.3.0", &chain(71401, true)).unwrap();
        assert!(l2.uses_l2_singleton);
        assert_eq!(l2.singleton.kind, ContractKind::SafeL2Singleton);

        let old_on_l2 = resolver.resolve("1.1.1", &chain(100, true)).unwrap();
        assert!(!old_on_l2.uses_l2_singleton);
        assert_eq!(old_on_l2.singleton.kind, ContractKind::SafeSingleton);

        let l1 = resolver.resolve("1.3.0", &chain(1, false)).unwrap();
        assert_eq!(l1.singleton.kind, ContractKind::SafeSingleton);
    }

    #[test]
    fn bundled_pre_v1_safe_uses_v100() {
        let resolver = DeploymentResolver::bundled("1.3.0").unwrap();
        let deployment = resolver.resolve("0.1.0", &chain(1, false)).unwrap();

        assert!(deployment.predates_supported);
        assert_eq!(deployment.singleton.version, "1.0.0");
        assert!(deployment.singleton_address().is_ok());
    }

    #[test]
    fn unknown_chain_has_no_master_contracts() {
        let resolver = DeploymentResolver::bundled("1.3.0").unwrap();
        let err = resolver.master_contracts(&chain(424242, false)).unwrap_err();

        assert!(matches!(err, ResolutionError::ContractNotFound { chain_id: 424242, .. }));
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn master_contracts_are_cached_per_chain() {
        let cache = Arc::new(DeploymentCache::new());
        let resolver = DeploymentResolver::bundled("1.3.0").unwrap().with_cache(cache.clone());

        let first = resolver.master_contracts(&chain(71402, true)).unwrap();
        let second = resolver.master_contracts(&chain(71402, true)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.multi_send.kind, ContractKind::MultiSendCallOnly);

        cache.invalidate(&71402);
        let third = resolver.master_contracts(&chain(71402, true)).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn rejects_unparseable_versions() {
        let resolver = DeploymentResolver::bundled("1.3.0").unwrap();
        assert_eq!(
            resolver.resolve("latest", &chain(1, false)).unwrap_err(),
            ResolutionError::InvalidVersion("latest".to_string())
        );
    }
}
