//! Bridging between the externally visible account address and the execution-layer address.
//!
//! Every component that needs an address in the other space goes through an
//! [AddressTranslator]. Misses are reported as [TranslationError::NotFound] and callers
//! building a list drop the entry instead of failing the whole batch, see [translate_each].

use std::collections::HashMap;

use alloy_primitives::Address;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    /// The address has no counterpart in the other address space (yet).
    #[error("no counterpart address registered for {0}")]
    NotFound(Address),

    /// The directory backing the translator could not be queried.
    #[error("address directory error: {0}")]
    Directory(String),
}

/// Direction of a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToInternal,
    ToExternal,
}

/// Translates addresses between the external account space and the execution-layer space.
///
/// Implementations must be idempotent: the same input yields the same mapping as long as the
/// underlying directory did not change. Results are not cached here.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AddressTranslator: Send + Sync {
    /// Resolves the execution-layer address of an external account.
    async fn to_internal(&self, external: Address) -> Result<Address, TranslationError>;

    /// Resolves the external account behind an execution-layer address.
    async fn to_external(&self, internal: Address) -> Result<Address, TranslationError>;
}

/// Translates `address` in the given direction.
pub async fn translate<T>(
    translator: &T,
    address: Address,
    direction: Direction,
) -> Result<Address, TranslationError>
where
    T: AddressTranslator + ?Sized,
{
    match direction {
        Direction::ToInternal => translator.to_internal(address).await,
        Direction::ToExternal => translator.to_external(address).await,
    }
}

/// Translator for chains where both address spaces coincide.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

#[async_trait]
impl AddressTranslator for IdentityTranslator {
    async fn to_internal(&self, external: Address) -> Result<Address, TranslationError> {
        Ok(external)
    }

    async fn to_external(&self, internal: Address) -> Result<Address, TranslationError> {
        Ok(internal)
    }
}

/// In-memory directory holding a fixed set of address pairs.
#[derive(Debug, Default)]
pub struct StaticAddressDirectory {
    to_internal: RwLock<HashMap<Address, Address>>,
    to_external: RwLock<HashMap<Address, Address>>,
}

impl StaticAddressDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an external/internal pair, replacing any earlier mapping of either side.
    pub fn insert(&self, external: Address, internal: Address) {
        let mut to_internal = self.to_internal.write();
        let mut to_external = self.to_external.write();

        if let Some(previous) = to_internal.insert(external, internal) {
            to_external.remove(&previous);
        }
        if let Some(previous) = to_external.insert(internal, external) {
            if previous != external {
                to_internal.remove(&previous);
            }
        }
    }

    pub fn remove(&self, external: Address) {
        let mut to_internal = self.to_internal.write();
        if let Some(internal) = to_internal.remove(&external) {
            self.to_external.write().remove(&internal);
        }
    }

    pub fn len(&self) -> usize {
        self.to_internal.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(Address, Address)> for StaticAddressDirectory {
    fn from_iter<I: IntoIterator<Item = (Address, Address)>>(iter: I) -> Self {
        let directory = Self::new();
        for (external, internal) in iter {
            directory.insert(external, internal);
        }
        directory
    }
}

#[async_trait]
impl AddressTranslator for StaticAddressDirectory {
    async fn to_internal(&self, external: Address) -> Result<Address, TranslationError> {
        self.to_internal
            .read()
            .get(&external)
            .copied()
            .ok_or(TranslationError::NotFound(external))
    }

    async fn to_external(&self, internal: Address) -> Result<Address, TranslationError> {
        self.to_external
            .read()
            .get(&internal)
            .copied()
            .ok_or(TranslationError::NotFound(internal))
    }
}

/// Translates every address, dropping the ones without a counterpart.
///
/// Order of the surviving addresses is preserved. Directory failures are dropped the same way:
/// a single unreachable lookup never aborts the batch.
pub async fn translate_each<T, I>(translator: &T, addresses: I, direction: Direction) -> Vec<Address>
where
    T: AddressTranslator + ?Sized,
    I: IntoIterator<Item = Address>,
{
    let mut translated = Vec::new();
    for address in addresses {
        match translate(translator, address, direction).await {
            Ok(counterpart) => translated.push(counterpart),
            Err(e) => {
                debug!(target: "safe::address", %address, ?direction, error = %e, "Skipping untranslatable address");
            }
        }
    }
    translated
}
