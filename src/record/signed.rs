//! Signing and verification of records.

use alloy::primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::blockchain::signer::{verify_signature, RecordSigner};
use crate::blockchain::types::SigningError;
use crate::observability::metrics;

/// A record with a deterministic byte encoding that can be signed.
pub trait Canonical {
    /// Short record kind used in logs and metrics.
    const KIND: &'static str;

    /// Bytes covered by the signature, bound to the signing address.
    fn canonical_bytes(&self, signer: &Address) -> Vec<u8>;

    /// Address the record itself claims as its author, if it has one.
    fn declared_author(&self) -> Option<Address> {
        None
    }
}

/// A record plus the signature of its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signed<R> {
    pub record: R,
    pub signer: Address,
    /// 65-byte `r || s || v` signature over the canonical bytes (EIP-191).
    pub signature: Bytes,
}

impl<R: Canonical> Signed<R> {
    /// Recompute the canonical bytes and check the signature against the
    /// recovered address. Never fails loudly: anything malformed is `false`.
    pub fn verify(&self) -> bool {
        if let Some(author) = self.record.declared_author() {
            if author != self.signer {
                return false;
            }
        }
        let bytes = self.record.canonical_bytes(&self.signer);
        verify_signature(&bytes, &self.signature, self.signer)
    }

    /// Identity of the signed record.
    pub fn hash(&self) -> B256 {
        keccak256(self.record.canonical_bytes(&self.signer))
    }
}

/// Sign `record` with `signer`.
///
/// The payload is left untouched; only a signature is attached.
pub async fn sign_with<R: Canonical>(
    record: R,
    signer: &dyn RecordSigner,
) -> Result<Signed<R>, SigningError> {
    let address = signer.address();
    if let Some(author) = record.declared_author() {
        if author != address {
            return Err(SigningError::Failed(format!(
                "record author {author} does not match signer {address}"
            )));
        }
    }

    let bytes = record.canonical_bytes(&address);
    let signature = signer.sign_bytes(&bytes).await?;

    tracing::debug!(kind = R::KIND, signer = %address, "Record signed");
    metrics::record_signed(R::KIND);

    Ok(Signed {
        record,
        signer: address,
        signature: Bytes::copy_from_slice(&signature.as_bytes()),
    })
}
