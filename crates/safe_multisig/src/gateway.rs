//! Models of the transaction gateway responses and the client interface the crate consumes.

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::transaction_data::ProposeTransactionBody;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("gateway request failed: {0}")]
pub struct GatewayError(pub String);

/// One page of a paginated gateway listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressEx {
    pub value: Address,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo_uri: Option<String>,
}

impl From<Address> for AddressEx {
    fn from(value: Address) -> Self {
        Self { value, name: None, logo_uri: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    AwaitingConfirmations,
    AwaitingExecution,
    Cancelled,
    Failed,
    Success,
    /// Submitted from this client, not yet indexed.
    Pending,
    PendingFailed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionInfo {
    #[serde(rename_all = "camelCase")]
    Multisig {
        nonce: u64,
        confirmations_required: u64,
        confirmations_submitted: u64,
        #[serde(default)]
        missing_signers: Option<Vec<AddressEx>>,
    },
    Module { address: AddressEx },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: String,
    pub timestamp: u64,
    pub tx_status: TransactionStatus,
    #[serde(default)]
    pub execution_info: Option<ExecutionInfo>,
    /// Transfer/settings/custom details, passed through untouched.
    #[serde(default)]
    pub tx_info: serde_json::Value,
}

impl TransactionSummary {
    /// Nonce of a multisig transaction, `None` for module transactions.
    pub fn multisig_nonce(&self) -> Option<u64> {
        match self.execution_info {
            Some(ExecutionInfo::Multisig { nonce, .. }) => Some(nonce),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionListItem {
    #[serde(rename_all = "camelCase")]
    Transaction {
        transaction: TransactionSummary,
        #[serde(default)]
        conflict_type: Option<String>,
    },
    Label { label: String },
    ConflictHeader { nonce: u64 },
    DateLabel { timestamp: u64 },
}

impl TransactionListItem {
    pub fn transaction(&self) -> Option<&TransactionSummary> {
        match self {
            TransactionListItem::Transaction { transaction, .. } => Some(transaction),
            _ => None,
        }
    }
}

/// Safe details as the gateway indexed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeInfo {
    pub address: AddressEx,
    pub chain_id: String,
    pub nonce: u64,
    pub threshold: u64,
    pub owners: Vec<AddressEx>,
    /// Singleton the proxy delegates to.
    #[serde(default)]
    pub implementation: Option<AddressEx>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Client of the transaction gateway. `cursor` is the opaque `next` token of a previous page.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TransactionGateway: Send + Sync {
    async fn transaction_history(
        &self,
        chain_id: u64,
        safe: Address,
        cursor: Option<String>,
    ) -> Result<Page<TransactionListItem>, GatewayError>;

    async fn transaction_queue(
        &self,
        chain_id: u64,
        safe: Address,
        cursor: Option<String>,
    ) -> Result<Page<TransactionListItem>, GatewayError>;

    /// Stores a proposed transaction so the other owners can confirm it.
    async fn propose_transaction(
        &self,
        chain_id: u64,
        safe: Address,
        body: ProposeTransactionBody,
    ) -> Result<TransactionSummary, GatewayError>;

    async fn safe_info(&self, chain_id: u64, safe: Address) -> Result<SafeInfo, GatewayError>;
}

/// Singleton behind the safe proxy at `proxy`. `None` when the gateway reports no implementation.
pub async fn master_copy_address<G>(
    gateway: &G,
    chain_id: u64,
    proxy: Address,
) -> Result<Option<Address>, GatewayError>
where
    G: TransactionGateway + ?Sized,
{
    let info = gateway.safe_info(chain_id, proxy).await?;

    match info.implementation.map(|implementation| implementation.value) {
        Some(master_copy) if !master_copy.is_zero() => {
            debug!(target: "safe::gateway", chain_id, %proxy, %master_copy, "Resolved master copy");
            Ok(Some(master_copy))
        }
        _ => {
            warn!(target: "safe::gateway", chain_id, %proxy, "No master copy known for proxy");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_queue_page() {
        let page: Page<TransactionListItem> = serde_json::from_value(json!({
            "next": "cursor=limit=20&offset=20",
            "previous": null,
            "results": [
                { "type": "LABEL", "label": "Next" },
                {
                    "type": "TRANSACTION",
                    "conflictType": "None",
                    "transaction": {
                        "id": "multisig_0x1_0x2",
                        "timestamp": 1640000000000u64,
                        "txStatus": "AWAITING_CONFIRMATIONS",
                        "txInfo": { "type": "Custom" },
                        "executionInfo": {
                            "type": "MULTISIG",
                            "nonce": 6,
                            "confirmationsRequired": 2,
                            "confirmationsSubmitted": 1,
                            "missingSigners": [
                                { "value": "0x0000000000000000000000000000000000000001" }
                            ]
                        }
                    }
                },
                { "type": "CONFLICT_HEADER", "nonce": 7 }
            ]
        }))
        .unwrap();

        assert_eq!(page.next.as_deref(), Some("cursor=limit=20&offset=20"));
        assert_eq!(page.results.len(), 3);

        let tx = page.results[1].transaction().unwrap();
        assert_eq!(tx.tx_status, TransactionStatus::AwaitingConfirmations);
        assert_eq!(tx.multisig_nonce(), Some(6));
        assert!(page.results[0].transaction().is_none());
    }

    #[test]
    fn unknown_status_is_tolerated() {
        let status: TransactionStatus = serde_json::from_value(json!("WILL_BE_REPLACED")).unwrap();
        assert_eq!(status, TransactionStatus::Unknown);
    }

    #[test]
    fn module_transactions_have_no_multisig_nonce() {
        let tx: TransactionSummary = serde_json::from_value(json!({
            "id": "module_0x1",
            "timestamp": 0,
            "txStatus": "SUCCESS",
            "executionInfo": {
                "type": "MODULE",
                "address": { "value": "0x0000000000000000000000000000000000000002" }
            }
        }))
        .unwrap();

        assert_eq!(tx.multisig_nonce(), None);
    }

    fn safe_info(implementation: Option<Address>) -> SafeInfo {
        SafeInfo {
            address: Address::repeat_byte(0x5a).into(),
            chain_id: "71401".to_string(),
            nonce: 3,
            threshold: 1,
            owners: vec![Address::repeat_byte(0x81).into()],
            implementation: implementation.map(AddressEx::from),
            version: Some("1.3.0".to_string()),
        }
    }

    #[test]
    fn parses_safe_info() {
        let info: SafeInfo = serde_json::from_value(json!({
            "address": { "value": "0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a" },
            "chainId": "71401",
            "nonce": 3,
            "threshold": 1,
            "owners": [{ "value": "0x8181818181818181818181818181818181818181" }],
            "implementation": { "value": "0x3e5c63644e683549055b9be8653de26e0b4cd36e", "name": "Gnosis Safe: Singleton L2" },
            "version": "1.3.0+L2"
        }))
        .unwrap();

        assert_eq!(info.nonce, 3);
        assert_eq!(info.owners.len(), 1);
        assert_eq!(info.implementation.unwrap().name.as_deref(), Some("Gnosis Safe: Singleton L2"));
    }

    #[tokio::test]
    async fn master_copy_comes_from_safe_info() {
        let singleton = Address::repeat_byte(0x3e);
        let mut gateway = MockTransactionGateway::new();
        gateway
            .expect_safe_info()
            .withf(|chain_id, safe| *chain_id == 71401 && *safe == Address::repeat_byte(0x5a))
            .times(1)
            .returning(move |_, _| Ok(safe_info(Some(singleton))));

        let master_copy =
            master_copy_address(&gateway, 71401, Address::repeat_byte(0x5a)).await.unwrap();
        assert_eq!(master_copy, Some(singleton));
    }

    #[tokio::test]
    async fn missing_or_zero_implementation_is_none() {
        let mut gateway = MockTransactionGateway::new();
        let mut calls = 0;
        gateway.expect_safe_info().times(2).returning(move |_, _| {
            calls += 1;
            Ok(safe_info(if calls == 1 { None } else { Some(Address::ZERO) }))
        });

        for _ in 0..2 {
            assert_eq!(master_copy_address(&gateway, 71401, Address::ZERO).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn gateway_failure_propagates() {
        let mut gateway = MockTransactionGateway::new();
        gateway
            .expect_safe_info()
            .returning(|_, _| Err(GatewayError("503 Service Unavailable".to_string())));

        assert!(master_copy_address(&gateway, 1, Address::ZERO).await.is_err());
    }
}
