use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use crate::{
    address::AddressTranslator,
    consts::DEPLOYMENT_GAS_MULTIPLIER,
    contracts::{ProxyFactory, Safe},
    deployments::WalletDeployment,
    error::{Error, Result},
};

/// Calldata deploying a new safe proxy through the proxy factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeCreationTransaction {
    pub proxy_factory: Address,
    pub singleton: Address,
    /// Execution-layer addresses of the owners, in the given order.
    pub owners: Vec<Address>,
    pub setup_data: Bytes,
    pub input_data: Bytes,
}

/// Builds the `createProxyWithNonce` call for a safe with `owners` and `threshold`.
///
/// Every owner must translate to its execution-layer address. A missing counterpart fails the
/// whole creation instead of deploying a safe with fewer owners.
pub async fn safe_creation_transaction<T>(
    master: &WalletDeployment,
    owners: &[Address],
    threshold: u64,
    salt_nonce: U256,
    translator: &T,
) -> Result<SafeCreationTransaction>
where
    T: AddressTranslator + ?Sized,
{
    if threshold == 0 || threshold > owners.len() as u64 {
        return Err(Error::InvalidThreshold { threshold, owners: owners.len() });
    }

    let mut internal = Vec::with_capacity(owners.len());
    for owner in owners {
        internal.push(translator.to_internal(*owner).await?);
    }

    let singleton = master.singleton_address()?;
    let proxy_factory = master.proxy_factory_address()?;
    let fallback_handler = master.fallback_handler_address()?;

    let setup_data: Bytes = Safe::setupCall::new((
        internal.clone(),
        U256::from(threshold),
        Address::ZERO,
        Bytes::new(),
        fallback_handler,
        Address::ZERO,
        U256::ZERO,
        Address::ZERO,
    ))
    .abi_encode()
    .into();

    let input_data =
        ProxyFactory::createProxyWithNonceCall::new((singleton, setup_data.clone(), salt_nonce))
            .abi_encode()
            .into();

    debug!(target: "safe::creation", chain_id = master.chain_id, %singleton, %proxy_factory, owners = internal.len(), threshold, %salt_nonce, "Built safe creation transaction");

    Ok(SafeCreationTransaction { proxy_factory, singleton, owners: internal, setup_data, input_data })
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait GasEstimator: Send + Sync {
    /// Gas a call of `input` from `from` to `to` would use.
    async fn estimate_gas(&self, from: Address, to: Address, input: Bytes) -> Result<u64>;
}

/// Gas limit for sending `creation` from `from`, twice the node's estimate.
pub async fn estimate_gas_for_deploying_safe<E>(
    estimator: &E,
    creation: &SafeCreationTransaction,
    from: Address,
) -> Result<u64>
where
    E: GasEstimator + ?Sized,
{
    let estimate =
        estimator.estimate_gas(from, creation.proxy_factory, creation.input_data.clone()).await?;
    let gas = estimate.saturating_mul(DEPLOYMENT_GAS_MULTIPLIER);

    debug!(target: "safe::creation", %from, estimate, gas, "Estimated safe deployment gas");

    Ok(gas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        address::{StaticAddressDirectory, TranslationError},
        config::ChainConfig,
        deployments::DeploymentResolver,
        error::ErrorKind,
    };
    use alloy_transport::TransportErrorKind;
    use mockall::predicate::eq;

    fn master() -> WalletDeployment {
        let chain = ChainConfig {
            chain_id: 71401,
            name: "Godwoken Testnet".to_string(),
            l2: true,
            rpc_url: None,
            transaction_service_url: None,
        };
        let resolver = DeploymentResolver::bundled("1.3.0").unwrap();
        resolver.master_contracts(&chain).unwrap().as_ref().clone()
    }

    fn directory() -> StaticAddressDirectory {
        (1..=3u8).map(|n| (Address::repeat_byte(n), Address::repeat_byte(0x80 + n))).collect()
    }

    #[tokio::test]
    async fn setup_uses_internal_owners() {
        let master = master();
        let owners = [Address::repeat_byte(2), Address::repeat_byte(1)];

        let creation =
            safe_creation_transaction(&master, &owners, 2, U256::from(42), &directory())
                .await
                .unwrap();

        assert_eq!(creation.owners, vec![Address::repeat_byte(0x82), Address::repeat_byte(0x81)]);
        assert_eq!(creation.proxy_factory, master.proxy_factory_address().unwrap());

        let call =
            ProxyFactory::createProxyWithNonceCall::abi_decode(&creation.input_data, true).unwrap();
        assert_eq!(call._singleton, creation.singleton);
        assert_eq!(call.saltNonce, U256::from(42));

        let setup = Safe::setupCall::abi_decode(&call.initializer, true).unwrap();
        assert_eq!(setup._owners, creation.owners);
        assert_eq!(setup._threshold, U256::from(2));
        assert_eq!(setup.fallbackHandler, master.fallback_handler_address().unwrap());
    }

    #[tokio::test]
    async fn any_untranslatable_owner_is_fatal() {
        let owners = [Address::repeat_byte(1), Address::repeat_byte(9)];

        let err = safe_creation_transaction(&master(), &owners, 1, U256::ZERO, &directory())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Translation(TranslationError::NotFound(owner)) if owner == Address::repeat_byte(9)
        ));
    }

    #[tokio::test]
    async fn threshold_must_fit_owners() {
        let owners = [Address::repeat_byte(1)];

        for threshold in [0, 2] {
            let err =
                safe_creation_transaction(&master(), &owners, threshold, U256::ZERO, &directory())
                    .await
                    .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[tokio::test]
    async fn deployment_gas_doubles_estimate() {
        let creation = safe_creation_transaction(
            &master(),
            &[Address::repeat_byte(1)],
            1,
            U256::ZERO,
            &directory(),
        )
        .await
        .unwrap();
        let from = Address::repeat_byte(0x01);

        let mut estimator = MockGasEstimator::new();
        estimator
            .expect_estimate_gas()
            .with(eq(from), eq(creation.proxy_factory), eq(creation.input_data.clone()))
            .times(1)
            .returning(|_, _, _| Ok(210_000));

        let gas = estimate_gas_for_deploying_safe(&estimator, &creation, from).await.unwrap();
        assert_eq!(gas, 420_000);
    }

    #[tokio::test]
    async fn deployment_gas_estimate_failure_propagates() {
        let creation = safe_creation_transaction(
            &master(),
            &[Address::repeat_byte(1)],
            1,
            U256::ZERO,
            &directory(),
        )
        .await
        .unwrap();

        let mut estimator = MockGasEstimator::new();
        estimator
            .expect_estimate_gas()
            .returning(|_, _, _| Err(TransportErrorKind::custom_str("execution reverted").into()));

        let err = estimate_gas_for_deploying_safe(&estimator, &creation, Address::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
