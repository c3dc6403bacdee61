use alloy_primitives::{Address, Bytes};
use tracing::info;

use crate::{
    address::AddressTranslator,
    error::{Error, Result},
    gateway::{TransactionGateway, TransactionSummary},
    transaction_data::{ProposeTransactionBody, SafeTransactionData},
    typed_data::TypedDataHasher,
};

/// A transaction to propose, signed or not by the proposing owner.
#[derive(Debug, Clone)]
pub struct Proposal<'a> {
    pub safe: Address,
    pub safe_version: &'a str,
    pub tx: &'a SafeTransactionData,
    /// External account of the proposing owner.
    pub sender: Address,
    pub signature: Option<Bytes>,
    pub origin: Option<String>,
}

/// Builds the gateway body for `proposal`.
///
/// The gateway expects the sender as execution-layer address. Unlike owner lists a missing
/// counterpart is an error here, a proposal without sender is rejected.
pub async fn build_proposal<T>(
    hasher: &TypedDataHasher,
    proposal: Proposal<'_>,
    translator: &T,
) -> Result<ProposeTransactionBody>
where
    T: AddressTranslator + ?Sized,
{
    let Proposal { safe, safe_version, tx, sender, signature, origin } = proposal;

    let safe_tx_hash = hasher.hash(safe, safe_version, tx)?;
    let sender = translator.to_internal(sender).await.map_err(Error::Translation)?;

    Ok(ProposeTransactionBody {
        to: tx.to,
        value: tx.value.to_string(),
        data: tx.data.clone(),
        operation: tx.operation,
        nonce: tx.nonce.to_string(),
        safe_tx_gas: tx.safe_tx_gas.to_string(),
        base_gas: tx.base_gas.to_string(),
        gas_price: tx.gas_price.to_string(),
        gas_token: tx.gas_token,
        refund_receiver: tx.refund_receiver,
        safe_tx_hash,
        sender,
        signature,
        origin,
    })
}

/// Builds the proposal and submits it to the gateway.
pub async fn propose_transaction<G, T>(
    gateway: &G,
    hasher: &TypedDataHasher,
    proposal: Proposal<'_>,
    translator: &T,
) -> Result<TransactionSummary>
where
    G: TransactionGateway + ?Sized,
    T: AddressTranslator + ?Sized,
{
    let safe = proposal.safe;
    let body = build_proposal(hasher, proposal, translator).await?;
    let safe_tx_hash = body.safe_tx_hash;

    let summary = gateway
        .propose_transaction(hasher.chain_id(), safe, body)
        .await
        .map_err(Error::Gateway)?;

    info!(target: "safe::proposal", %safe, %safe_tx_hash, id = %summary.id, "Proposed transaction");

    Ok(summary)
}
