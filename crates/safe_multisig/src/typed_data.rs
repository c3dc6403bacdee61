//! EIP-712 typed data of a safe transaction.
//!
//! The message schema depends on the version of the safe contract. Each supported layout is a
//! [SafeTxSchema] variant, picked from [SCHEMA_TABLE] by version range.

use std::collections::BTreeMap;

use alloy_dyn_abi::TypedData;
use alloy_primitives::{hex, keccak256, Address, B256, U256};
use alloy_sol_types::Eip712Domain;
use semver::Version;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    error::{Error, Result},
    transaction_data::SafeTransactionData,
    utils::parse_safe_version,
};

pub const SAFE_TX_TYPE: &str = "SafeTx";
pub const EIP712_DOMAIN_TYPE: &str = "EIP712Domain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eip712Field {
    #[serde(rename = "type")]
    pub field_type: &'static str,
    pub name: &'static str,
}

const fn field(field_type: &'static str, name: &'static str) -> Eip712Field {
    Eip712Field { field_type, name }
}

/// The transaction argument a message field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxField {
    To,
    Value,
    Data,
    Operation,
    SafeTxGas,
    BaseGas,
    GasPrice,
    GasToken,
    RefundReceiver,
    Nonce,
}

type SchemaFields = [(TxField, Eip712Field); 10];

const SAFE_TX_FIELDS: SchemaFields = [
    (TxField::To, field("address", "to")),
    (TxField::Value, field("uint256", "value")),
    (TxField::Data, field("bytes", "data")),
    (TxField::Operation, field("uint8", "operation")),
    (TxField::SafeTxGas, field("uint256", "safeTxGas")),
    (TxField::BaseGas, field("uint256", "baseGas")),
    (TxField::GasPrice, field("uint256", "gasPrice")),
    (TxField::GasToken, field("address", "gasToken")),
    (TxField::RefundReceiver, field("address", "refundReceiver")),
    (TxField::Nonce, field("uint256", "nonce")),
];

// Safes before v1.0.0 call the refund base `dataGas`.
const SAFE_TX_FIELDS_BEFORE_V100: SchemaFields = [
    (TxField::To, field("address", "to")),
    (TxField::Value, field("uint256", "value")),
    (TxField::Data, field("bytes", "data")),
    (TxField::Operation, field("uint8", "operation")),
    (TxField::SafeTxGas, field("uint256", "safeTxGas")),
    (TxField::BaseGas, field("uint256", "dataGas")),
    (TxField::GasPrice, field("uint256", "gasPrice")),
    (TxField::GasToken, field("address", "gasToken")),
    (TxField::RefundReceiver, field("address", "refundReceiver")),
    (TxField::Nonce, field("uint256", "nonce")),
];

const EIP712_DOMAIN_BEFORE_V130: [Eip712Field; 1] = [field("address", "verifyingContract")];

// Domain for v1.3.0 and later.
const EIP712_DOMAIN: [Eip712Field; 2] =
    [field("uint256", "chainId"), field("address", "verifyingContract")];

/// Layout of the `SafeTx` message and its signing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeTxSchema {
    /// `dataGas` naming, domain without chain id.
    BeforeV100,
    /// `baseGas` naming, domain without chain id.
    BeforeV130,
    /// `baseGas` naming, domain bound to the chain id.
    V130,
}

fn release(version: &Version) -> Version {
    Version { build: semver::BuildMetadata::EMPTY, ..version.clone() }
}

fn before_v100(version: &Version) -> bool {
    release(version) < Version::new(1, 0, 0)
}

fn before_v130(version: &Version) -> bool {
    release(version) < Version::new(1, 3, 0)
}

fn any_version(_: &Version) -> bool {
    true
}

/// Version predicates in evaluation order, the first match wins.
pub const SCHEMA_TABLE: [(fn(&Version) -> bool, SafeTxSchema); 3] = [
    (before_v100, SafeTxSchema::BeforeV100),
    (before_v130, SafeTxSchema::BeforeV130),
    (any_version, SafeTxSchema::V130),
];

impl SafeTxSchema {
    pub fn for_version(version: &Version) -> Self {
        SCHEMA_TABLE
            .iter()
            .find(|(matches, _)| matches(version))
            .map(|(_, schema)| *schema)
            .unwrap_or(SafeTxSchema::V130)
    }

    pub fn parse(version: &str) -> Result<Self> {
        Ok(Self::for_version(&parse_safe_version(version)?))
    }

    pub fn safe_tx_fields(self) -> &'static SchemaFields {
        match self {
            SafeTxSchema::BeforeV100 => &SAFE_TX_FIELDS_BEFORE_V100,
            SafeTxSchema::BeforeV130 | SafeTxSchema::V130 => &SAFE_TX_FIELDS,
        }
    }

    /// The `SafeTx` member list as it appears under `types`.
    pub fn safe_tx_layout(self) -> &'static [Eip712Field] {
        match self {
            SafeTxSchema::BeforeV100 => &SAFE_TX_LAYOUT_BEFORE_V100,
            SafeTxSchema::BeforeV130 | SafeTxSchema::V130 => &SAFE_TX_LAYOUT,
        }
    }

    pub fn domain_fields(self) -> &'static [Eip712Field] {
        match self {
            SafeTxSchema::BeforeV100 | SafeTxSchema::BeforeV130 => &EIP712_DOMAIN_BEFORE_V130,
            SafeTxSchema::V130 => &EIP712_DOMAIN,
        }
    }

    pub fn domain(self, safe: Address, chain_id: u64) -> Eip712Domain {
        let chain_id = match self {
            SafeTxSchema::V130 => Some(U256::from(chain_id)),
            _ => None,
        };
        Eip712Domain::new(None, None, chain_id, Some(safe), None)
    }

    /// `SafeTx(address to,...)` as hashed into the type hash.
    pub fn encode_type(self) -> String {
        let members = self
            .safe_tx_layout()
            .iter()
            .map(|f| format!("{} {}", f.field_type, f.name))
            .collect::<Vec<_>>()
            .join(",");
        format!("{SAFE_TX_TYPE}({members})")
    }

    pub fn type_hash(self) -> B256 {
        keccak256(self.encode_type())
    }
}

fn message_value(tx: &SafeTransactionData, source: TxField) -> Value {
    // numbers travel as decimal strings, they do not fit a JSON number
    match source {
        TxField::To => Value::String(tx.to.to_checksum(None)),
        TxField::Value => Value::String(tx.value.to_string()),
        TxField::Data => Value::String(hex::encode_prefixed(&tx.data)),
        TxField::Operation => Value::from(u8::from(tx.operation)),
        TxField::SafeTxGas => Value::String(tx.safe_tx_gas.to_string()),
        TxField::BaseGas => Value::String(tx.base_gas.to_string()),
        TxField::GasPrice => Value::String(tx.gas_price.to_string()),
        TxField::GasToken => Value::String(tx.gas_token.to_checksum(None)),
        TxField::RefundReceiver => Value::String(tx.refund_receiver.to_checksum(None)),
        TxField::Nonce => Value::String(tx.nonce.to_string()),
    }
}

/// The typed-data document of a safe transaction, as handed to `eth_signTypedData_v4`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTypedData {
    #[serde(skip)]
    pub schema: SafeTxSchema,
    pub types: BTreeMap<&'static str, &'static [Eip712Field]>,
    pub primary_type: &'static str,
    pub domain: Eip712Domain,
    pub message: Map<String, Value>,
}

impl SafeTypedData {
    pub fn new(
        schema: SafeTxSchema,
        safe: Address,
        chain_id: u64,
        tx: &SafeTransactionData,
    ) -> Self {
        let fields = schema.safe_tx_fields();

        let mut types: BTreeMap<&'static str, &'static [Eip712Field]> = BTreeMap::new();
        types.insert(EIP712_DOMAIN_TYPE, schema.domain_fields());
        types.insert(SAFE_TX_TYPE, schema.safe_tx_layout());

        let message = fields
            .iter()
            .map(|(source, f)| (f.name.to_string(), message_value(tx, *source)))
            .collect();

        Self {
            schema,
            types,
            primary_type: SAFE_TX_TYPE,
            domain: schema.domain(safe, chain_id),
            message,
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| Error::TypedData(e.to_string()))
    }

    /// `keccak256(0x1901 ‖ domainSeparator ‖ hashStruct(message))`.
    pub fn signing_hash(&self) -> Result<B256> {
        let typed_data: TypedData =
            serde_json::from_value(self.to_json()?).map_err(|e| Error::TypedData(e.to_string()))?;
        typed_data
            .eip712_signing_hash()
            .map_err(|e| Error::TypedData(e.to_string()))
    }
}

const fn layout(fields: &SchemaFields) -> [Eip712Field; 10] {
    let mut out = [field("", ""); 10];
    let mut i = 0;
    while i < 10 {
        out[i] = fields[i].1;
        i += 1;
    }
    out
}

const SAFE_TX_LAYOUT_BEFORE_V100: [Eip712Field; 10] = layout(&SAFE_TX_FIELDS_BEFORE_V100);
const SAFE_TX_LAYOUT: [Eip712Field; 10] = layout(&SAFE_TX_FIELDS);

/// Computes safe transaction hashes for one chain.
#[derive(Debug, Clone, Copy)]
pub struct TypedDataHasher {
    chain_id: u64,
}

impl TypedDataHasher {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn typed_data(
        &self,
        safe: Address,
        safe_version: &str,
        tx: &SafeTransactionData,
    ) -> Result<SafeTypedData> {
        let schema = SafeTxSchema::parse(safe_version)?;
        Ok(SafeTypedData::new(schema, safe, self.chain_id, tx))
    }

    /// The hash the safe at `safe` computes in `getTransactionHash` for `tx`.
    pub fn hash(&self, safe: Address, safe_version: &str, tx: &SafeTransactionData) -> Result<B256> {
        let typed_data = self.typed_data(safe, safe_version, tx)?;
        let hash = typed_data.signing_hash()?;

        trace!(target: "safe::typed_data", %safe, safe_version, schema = ?typed_data.schema, %hash, "Computed safe tx hash");

        Ok(hash)
    }
}
