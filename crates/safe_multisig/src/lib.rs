//! Client side core of a Safe multisig wallet.
//!
//! Hashes safe transactions per contract version, assembles owner signatures, decides whether
//! a transaction can execute right away and resolves the contracts deployed per chain. Every
//! address that crosses between the external account space and the execution layer goes
//! through an [address::AddressTranslator].
//!
//! ```
//! use alloy_primitives::{Address, Bytes, U256};
//! use safe_multisig::{SafeTransactionData, TypedDataHasher};
//!
//! let tx = SafeTransactionData::call(Address::repeat_byte(0x0b), U256::ZERO, Bytes::new(), U256::ZERO);
//! let hash = TypedDataHasher::new(1).hash(Address::repeat_byte(0x5a), "1.3.0", &tx)?;
//! assert!(!hash.is_zero());
//! # Ok::<(), safe_multisig::Error>(())
//! ```

pub mod address;
pub mod calls;
pub mod config;
pub mod consts;
pub mod contracts;
pub mod creation;
pub mod deployments;
pub mod error;
pub mod execution;
pub mod gateway;
pub mod owners;
pub mod pagination;
pub mod proposal;
pub mod signatures;
pub mod signing;
pub mod store;
pub mod transaction_data;
pub mod typed_data;
pub mod watcher;

mod utils;

pub use address::{AddressTranslator, IdentityTranslator, StaticAddressDirectory};
pub use config::{ChainConfig, SafeConfig};
pub use deployments::{DeploymentCache, DeploymentResolver, WalletDeployment};
pub use error::{Error, ErrorKind, Result};
pub use execution::{can_execute_now, should_execute_transaction, SafeState};
pub use signatures::{generate_signatures_from_confirmations, Confirmation, SignatureBlob};
pub use transaction_data::{Operation, SafeTransactionData};
pub use typed_data::TypedDataHasher;
pub use utils::parse_safe_version;
