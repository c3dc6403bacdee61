use alloy_primitives::U256;
use async_trait::async_trait;
use tracing::trace;

use crate::{
    error::Result,
    gateway::{TransactionStatus, TransactionSummary},
};

/// On-chain state of a safe needed to decide on execution.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait SafeState: Send + Sync {
    async fn nonce(&self) -> Result<U256>;

    async fn threshold(&self) -> Result<U256>;
}

/// Decides whether a transaction with `nonce` can be executed right away instead of waiting in
/// the queue for more approvals.
///
/// An executable transaction is either the first one, the next in sequence, or the direct
/// successor of the last queued transaction when that one succeeded. Anything else waits until
/// its predecessor is executed.
pub fn can_execute_now(
    safe_nonce: U256,
    threshold: U256,
    nonce: U256,
    last_tx: Option<&TransactionSummary>,
) -> bool {
    // needs to collect owners signatures
    if threshold > U256::from(1) {
        return false;
    }

    if nonce.is_zero() {
        return true;
    }

    if nonce == safe_nonce {
        return true;
    }

    // TODO: a failed predecessor leaves later nonces queued, there is no recovery path yet
    match last_tx {
        Some(tx) => match tx.multisig_nonce() {
            Some(last_nonce) => {
                tx.tx_status == TransactionStatus::Success
                    && U256::from(last_nonce) + U256::from(1) == nonce
            }
            None => false,
        },
        None => false,
    }
}

/// Reads nonce and threshold of the safe and evaluates [can_execute_now].
pub async fn should_execute_transaction<S>(
    safe: &S,
    nonce: U256,
    last_tx: Option<&TransactionSummary>,
) -> Result<bool>
where
    S: SafeState + ?Sized,
{
    let safe_nonce = safe.nonce().await?;
    let threshold = safe.threshold().await?;

    let execute = can_execute_now(safe_nonce, threshold, nonce, last_tx);
    trace!(target: "safe::execution", %safe_nonce, %threshold, %nonce, execute, "Evaluated execution eligibility");

    Ok(execute)
}
