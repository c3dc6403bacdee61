use std::marker::PhantomData;

use alloy_network::{Network, TransactionBuilder};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_sol_types::SolCall;
use alloy_transport::Transport;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    address::AddressTranslator,
    consts::SENTINEL_ADDRESS,
    contracts::{MultiSendCallOnly, Safe, SignMessageLib},
    creation::GasEstimator,
    error::{Error, Result},
    execution::SafeState,
    signatures::SignatureBlob,
    transaction_data::{ExecutableSafeTransaction, MetaTransaction, Operation, SafeTransactionData},
    typed_data::TypedDataHasher,
};

pub fn exec_transaction(
    safe_tx: &SafeTransactionData,
    signatures: &SignatureBlob,
    safe: Address,
) -> ExecutableSafeTransaction {
    let call = Safe::execTransactionCall::new((
        safe_tx.to,
        safe_tx.value,
        safe_tx.data.clone(),
        safe_tx.operation.into(),
        safe_tx.safe_tx_gas,
        safe_tx.base_gas,
        safe_tx.gas_price,
        safe_tx.gas_token,
        safe_tx.refund_receiver,
        signatures.as_bytes().clone(),
    ));

    ExecutableSafeTransaction { safe_address: safe, input_data: call.abi_encode().into() }
}

/// Packs `transactions` the way `multiSend` expects them.
pub fn encode_multi_send(transactions: &[MetaTransaction]) -> Bytes {
    let mut packed = Vec::new();
    for tx in transactions {
        packed.push(u8::from(tx.operation));
        packed.extend_from_slice(tx.to.as_slice());
        packed.extend_from_slice(&tx.value.to_be_bytes::<32>());
        packed.extend_from_slice(&U256::from(tx.data.len()).to_be_bytes::<32>());
        packed.extend_from_slice(&tx.data);
    }
    packed.into()
}

/// Batches `transactions` into one safe transaction delegating to `multi_send`.
pub fn multi_send_transaction(
    multi_send: Address,
    transactions: &[MetaTransaction],
    nonce: U256,
) -> SafeTransactionData {
    let call = MultiSendCallOnly::multiSendCall::new((encode_multi_send(transactions),));

    SafeTransactionData {
        operation: Operation::DelegateCall,
        ..SafeTransactionData::call(multi_send, U256::ZERO, call.abi_encode().into(), nonce)
    }
}

/// Safe transaction that signs `message` on-chain through `sign_message_lib`.
pub fn sign_message_transaction(
    sign_message_lib: Address,
    message: Bytes,
    nonce: U256,
) -> SafeTransactionData {
    let call = SignMessageLib::signMessageCall::new((message,));

    SafeTransactionData {
        operation: Operation::DelegateCall,
        ..SafeTransactionData::call(sign_message_lib, U256::ZERO, call.abi_encode().into(), nonce)
    }
}

/// Safe transaction adding `owner` and setting the threshold to `threshold`.
///
/// The safe stores owners by execution-layer address, so `owner` is translated first. A missing
/// counterpart fails the transaction.
pub async fn add_owner_transaction<T>(
    safe: Address,
    owner: Address,
    threshold: u64,
    owner_count: usize,
    nonce: U256,
    translator: &T,
) -> Result<SafeTransactionData>
where
    T: AddressTranslator + ?Sized,
{
    let owners = owner_count + 1;
    if threshold == 0 || threshold > owners as u64 {
        return Err(Error::InvalidThreshold { threshold, owners });
    }

    let internal = translator.to_internal(owner).await?;
    let call = Safe::addOwnerWithThresholdCall::new((internal, U256::from(threshold)));

    debug!(target: "safe::calls", %safe, %owner, %internal, threshold, "Built add owner transaction");

    Ok(SafeTransactionData::call(safe, U256::ZERO, call.abi_encode().into(), nonce))
}

/// Predecessor of `owner` in the owner list, the sentinel for the first owner.
pub fn previous_owner(owners: &[Address], owner: Address) -> Option<Address> {
    let index = owners.iter().position(|o| *o == owner)?;
    Some(index.checked_sub(1).map_or(SENTINEL_ADDRESS, |prev| owners[prev]))
}

/// Safe transaction replacing `old_owner` with `new_owner`.
///
/// `owners` is the on-chain owner list (execution-layer addresses, as `getOwners` returns them).
/// Both owners are external accounts and must translate.
pub async fn swap_owner_transaction<T>(
    safe: Address,
    owners: &[Address],
    old_owner: Address,
    new_owner: Address,
    nonce: U256,
    translator: &T,
) -> Result<SafeTransactionData>
where
    T: AddressTranslator + ?Sized,
{
    let old_internal = translator.to_internal(old_owner).await?;
    let new_internal = translator.to_internal(new_owner).await?;

    let prev_owner =
        previous_owner(owners, old_internal).ok_or(Error::NotAnOwner { owner: old_owner })?;
    let call = Safe::swapOwnerCall::new((prev_owner, old_internal, new_internal));

    debug!(target: "safe::calls", %safe, %old_owner, %new_owner, %prev_owner, "Built swap owner transaction");

    Ok(SafeTransactionData::call(safe, U256::ZERO, call.abi_encode().into(), nonce))
}

fn safe_instance<P, T, N>(safe: Address, provider: &P) -> Safe::SafeInstance<T, &P, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    Safe::SafeInstance::new(safe, provider)
}

pub async fn get_nonce<P, T, N>(safe: Address, provider: &P) -> Result<U256>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    let Safe::nonceReturn { _0: nonce } = safe_instance(safe, provider).nonce().call().await?;

    Ok(nonce)
}

pub async fn get_owners<P, T, N>(safe: Address, provider: &P) -> Result<Vec<Address>>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    let Safe::getOwnersReturn { _0: owners } = safe_instance(safe, provider).getOwners().call().await?;

    Ok(owners)
}

pub async fn get_threshold<P, T, N>(safe: Address, provider: &P) -> Result<U256>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    let Safe::getThresholdReturn { _0: threshold } =
        safe_instance(safe, provider).getThreshold().call().await?;

    Ok(threshold)
}

pub async fn get_transaction_hash<P, T, N>(
    safe_tx: &SafeTransactionData,
    safe: Address,
    provider: &P,
) -> Result<B256>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    let Safe::getTransactionHashReturn { _0: tx_hash } = safe_instance(safe, provider)
        .getTransactionHash(
            safe_tx.to,
            safe_tx.value,
            safe_tx.data.clone(),
            safe_tx.operation.into(),
            safe_tx.safe_tx_gas,
            safe_tx.base_gas,
            safe_tx.gas_price,
            safe_tx.gas_token,
            safe_tx.refund_receiver,
            safe_tx.nonce,
        )
        .call()
        .await?;

    Ok(tx_hash)
}

pub async fn get_version<P, T, N>(safe: Address, provider: &P) -> Result<String>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    let Safe::VERSIONReturn { _0: version } = safe_instance(safe, provider).VERSION().call().await?;

    Ok(version)
}

pub async fn is_owner<P, T, N>(address: Address, safe: Address, provider: &P) -> Result<bool>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    let Safe::isOwnerReturn { _0: is_owner } =
        safe_instance(safe, provider).isOwner(address).call().await?;

    Ok(is_owner)
}

/// Fails with [Error::HashMismatch] unless both hashes agree.
pub fn ensure_hash_matches(safe: Address, local: B256, on_chain: B256) -> Result<B256> {
    if local != on_chain {
        warn!(target: "safe::calls", %safe, %local, %on_chain, "Safe tx hash mismatch");
        return Err(Error::HashMismatch { safe, local, on_chain });
    }
    Ok(local)
}

/// Hashes `safe_tx` locally and checks the result against the safe's `getTransactionHash`.
pub async fn verify_transaction_hash<P, T, N>(
    hasher: &TypedDataHasher,
    safe: Address,
    safe_version: &str,
    safe_tx: &SafeTransactionData,
    provider: &P,
) -> Result<B256>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    let local = hasher.hash(safe, safe_version, safe_tx)?;
    let on_chain = get_transaction_hash(safe_tx, safe, provider).await?;

    debug!(target: "safe::calls", %safe, safe_version, %local, "Verifying safe tx hash against contract");

    ensure_hash_matches(safe, local, on_chain)
}

/// [SafeState] read from the safe contract through a provider.
pub struct OnChainSafe<P, T, N> {
    address: Address,
    provider: P,
    _marker: PhantomData<fn() -> (T, N)>,
}

impl<P, T, N> OnChainSafe<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    pub fn new(address: Address, provider: P) -> Self {
        Self { address, provider, _marker: PhantomData }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn owners(&self) -> Result<Vec<Address>> {
        get_owners(self.address, &self.provider).await
    }

    pub async fn version(&self) -> Result<String> {
        get_version(self.address, &self.provider).await
    }

    pub async fn is_owner(&self, address: Address) -> Result<bool> {
        is_owner(address, self.address, &self.provider).await
    }
}

#[async_trait]
impl<P, T, N> SafeState for OnChainSafe<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    async fn nonce(&self) -> Result<U256> {
        get_nonce(self.address, &self.provider).await
    }

    async fn threshold(&self) -> Result<U256> {
        get_threshold(self.address, &self.provider).await
    }
}

/// [GasEstimator] backed by `eth_estimateGas` of a provider.
pub struct ProviderGasEstimator<P, T, N> {
    provider: P,
    _marker: PhantomData<fn() -> (T, N)>,
}

impl<P, T, N> ProviderGasEstimator<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    pub fn new(provider: P) -> Self {
        Self { provider, _marker: PhantomData }
    }
}

#[async_trait]
impl<P, T, N> GasEstimator for ProviderGasEstimator<P, T, N>
where
    P: Provider<T, N>,
    T: Transport + Clone,
    N: Network,
{
    async fn estimate_gas(&self, from: Address, to: Address, input: Bytes) -> Result<u64> {
        let request =
            N::TransactionRequest::default().with_from(from).with_to(to).with_input(input);

        Ok(self.provider.estimate_gas(&request).await?)
    }
}
