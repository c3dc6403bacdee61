//! Assembly of the `signatures` argument of `execTransaction`.
//!
//! The contract walks the blob in 65 byte steps and requires the recovered owners to be
//! strictly ascending, so entries are sorted by owner before they are concatenated.
//! See <https://docs.safe.global/advanced/smart-account-signatures#pre-validated-signatures>.

use std::fmt;

use alloy_primitives::{hex, Address, Bytes};
use tracing::{debug, warn};

use crate::address::{AddressTranslator, TranslationError};

/// Length of an ECDSA or pre-validated signature in the blob.
pub const SIGNATURE_LENGTH: usize = 65;

/// Signature type byte marking a pre-validated (`approveHash` / `msg.sender`) entry.
pub const PRE_VALIDATED_SIGNATURE_TYPE: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    /// A pre-validated owner has no execution-layer address, the blob cannot be completed.
    #[error("can't convert owner {0} to its execution-layer address")]
    PreValidatedOwnerNotFound(Address),

    /// The address directory failed while encoding a pre-validated owner.
    #[error("address directory failed for owner {owner}: {reason}")]
    Directory { owner: Address, reason: String },
}

/// An owner approval. `signature: None` means the owner approved on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub owner: Address,
    pub signature: Option<Bytes>,
}

impl Confirmation {
    pub fn signed(owner: Address, signature: Bytes) -> Self {
        Self { owner, signature: Some(signature) }
    }

    pub fn pre_validated(owner: Address) -> Self {
        Self { owner, signature: None }
    }
}

/// Concatenated owner signatures, frozen once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureBlob(Bytes);

impl SignatureBlob {
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SignatureBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_prefixed(&self.0))
    }
}

impl From<Bytes> for SignatureBlob {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for SignatureBlob {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// Encodes the pre-validated signature of `owner`: the left padded execution-layer address as
/// `r`, a zero `s` and type byte `1`.
pub async fn pre_validated_signature<T>(
    owner: Address,
    translator: &T,
) -> Result<[u8; SIGNATURE_LENGTH], AssemblyError>
where
    T: AddressTranslator + ?Sized,
{
    let internal = translator.to_internal(owner).await.map_err(|e| match e {
        TranslationError::NotFound(_) => AssemblyError::PreValidatedOwnerNotFound(owner),
        TranslationError::Directory(reason) => AssemblyError::Directory { owner, reason },
    })?;

    let mut signature = [0u8; SIGNATURE_LENGTH];
    signature[12..32].copy_from_slice(internal.as_slice());
    signature[SIGNATURE_LENGTH - 1] = PRE_VALIDATED_SIGNATURE_TYPE;
    Ok(signature)
}

/// Builds the signature blob from the collected confirmations.
///
/// `pre_approving_owner` is the executing owner: it joins as a pre-validated entry unless it
/// already confirmed. Entries are ordered by owner address; comparing [Address] bytes is the
/// same order as comparing the lowercase hex strings.
pub async fn generate_signatures_from_confirmations<T>(
    confirmations: &[Confirmation],
    pre_approving_owner: Option<Address>,
    translator: &T,
) -> Result<SignatureBlob, AssemblyError>
where
    T: AddressTranslator + ?Sized,
{
    let mut entries = confirmations.iter().cloned().collect::<Vec<_>>();

    if let Some(owner) = pre_approving_owner {
        if entries.iter().any(|c| c.owner == owner) {
            debug!(target: "safe::signatures", %owner, "Pre-approving owner already confirmed");
        } else {
            entries.push(Confirmation::pre_validated(owner));
        }
    }

    entries.sort_by_key(|c| c.owner);

    let mut blob = Vec::with_capacity(entries.len() * SIGNATURE_LENGTH);
    for Confirmation { owner, signature } in &entries {
        match signature {
            Some(signature) => {
                if signature.len() != SIGNATURE_LENGTH {
                    warn!(target: "safe::signatures", %owner, len = signature.len(), "Unexpected signature length");
                }
                blob.extend_from_slice(signature);
            }
            None => blob.extend_from_slice(&pre_validated_signature(*owner, translator).await?),
        }
    }

    Ok(SignatureBlob(blob.into()))
}
