//! Signer abstraction for records.
//!
//! Anything able to produce an EIP-191 personal-message signature can sign
//! records: a local key ([`Wallet`](crate::blockchain::wallet::Wallet)), a
//! remote wallet bridge, or a test double.

use alloy::primitives::Address;
use alloy::signers::Signature;
use async_trait::async_trait;

use crate::blockchain::types::SigningError;

/// A wallet-backed signer of arbitrary byte sequences.
#[async_trait]
pub trait RecordSigner: Send + Sync {
    /// Address whose key produces the signatures.
    fn address(&self) -> Address;

    /// Sign `message` with the Ethereum personal-message prefix.
    async fn sign_bytes(&self, message: &[u8]) -> Result<Signature, SigningError>;
}

/// Check that `signature` over `message` recovers to `expected`.
///
/// Returns `false` for malformed signatures instead of failing.
pub fn verify_signature(message: &[u8], signature: &[u8], expected: Address) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };
    matches!(signature.recover_address_from_msg(message), Ok(recovered) if recovered == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::wallet::Wallet;

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_verify_roundtrip() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();
        let signature = wallet.sign_bytes(b"payload").await.unwrap();
        let bytes = signature.as_bytes();

        assert!(verify_signature(b"payload", &bytes, wallet.address()));
        assert!(!verify_signature(b"payloaD", &bytes, wallet.address()));
        assert!(!verify_signature(b"payload", &bytes, Address::ZERO));
    }

    #[test]
    fn test_malformed_signature() {
        assert!(!verify_signature(b"payload", &[], Address::ZERO));
        assert!(!verify_signature(b"payload", &[0xab; 64], Address::ZERO));
        assert!(!verify_signature(b"payload", &[0xff; 65], Address::ZERO));
    }
}
