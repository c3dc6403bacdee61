use alloy_primitives::{Bytes, B256};
use alloy_signer::Signer;
use semver::VersionReq;
use tracing::debug;

use crate::{error::Result, signatures::Confirmation, utils::version_satisfies};

/// Safes from this version on verify EIP-712 signatures of the safe tx hash.
pub const SAFE_VERSION_FOR_OFF_CHAIN_SIGNATURES: &str = ">=1.0.0";

/// Whether an owner can confirm with an off-chain signature instead of an on-chain approval.
///
/// Executions always go on-chain, as do smart-contract wallets which cannot produce an ECDSA
/// signature. Unknown safe versions are treated as not supporting it.
pub fn check_if_off_chain_signature_is_possible(
    is_execution: bool,
    is_smart_contract_wallet: bool,
    safe_version: Option<&str>,
) -> bool {
    let Ok(requirement) = VersionReq::parse(SAFE_VERSION_FOR_OFF_CHAIN_SIGNATURES) else {
        return false;
    };

    !is_execution
        && !is_smart_contract_wallet
        && safe_version.is_some_and(|version| version_satisfies(version, &requirement))
}

/// Signs the safe tx hash and returns the resulting owner confirmation.
pub async fn sign_safe_tx_hash<S>(signer: &S, safe_tx_hash: B256) -> Result<Confirmation>
where
    S: Signer + Send + Sync + ?Sized,
{
    let signature = signer.sign_hash(&safe_tx_hash).await?;
    let owner = signer.address();

    debug!(target: "safe::signing", %owner, %safe_tx_hash, "Signed safe tx hash");

    Ok(Confirmation::signed(owner, Bytes::copy_from_slice(&signature.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signatures::SIGNATURE_LENGTH;
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn off_chain_signature_rules() {
        assert!(check_if_off_chain_signature_is_possible(false, false, Some("1.3.0")));
        assert!(check_if_off_chain_signature_is_possible(false, false, Some("1.0.0")));

        assert!(!check_if_off_chain_signature_is_possible(true, false, Some("1.3.0")));
        assert!(!check_if_off_chain_signature_is_possible(false, true, Some("1.3.0")));
        assert!(!check_if_off_chain_signature_is_possible(false, false, Some("0.1.0")));
        assert!(!check_if_off_chain_signature_is_possible(false, false, None));
        assert!(!check_if_off_chain_signature_is_possible(false, false, Some("unknown")));
    }

    #[tokio::test]
    async fn signature_belongs_to_signer() {
        let signer = PrivateKeySigner::random();
        let hash = B256::repeat_byte(0x42);

        let confirmation = sign_safe_tx_hash(&signer, hash).await.unwrap();
        let signature = confirmation.signature.clone().unwrap();

        assert_eq!(confirmation.owner, signer.address());
        assert_eq!(signature.len(), SIGNATURE_LENGTH);
        assert!(matches!(signature[SIGNATURE_LENGTH - 1], 27 | 28));

        // deterministic nonce
        let again = sign_safe_tx_hash(&signer, hash).await.unwrap();
        assert_eq!(again, confirmation);
    }
}
