//! Anchor maps: fixed-size digest pairs committed on-chain.

use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

use crate::record::types::ValidationError;

/// One `(key, value)` pair of 32-byte digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorPair {
    pub key: B256,
    pub value: B256,
}

impl AnchorPair {
    pub fn new(key: B256, value: B256) -> Self {
        Self { key, value }
    }

    /// Build a pair from raw digests, which must be exactly 32 bytes each.
    pub fn from_slices(key: &[u8], value: &[u8]) -> Result<Self, ValidationError> {
        Ok(Self {
            key: digest("key", key)?,
            value: digest("value", value)?,
        })
    }
}

fn digest(field: &'static str, bytes: &[u8]) -> Result<B256, ValidationError> {
    B256::try_from(bytes).map_err(|_| ValidationError::DigestLength {
        field,
        len: bytes.len(),
    })
}

/// Ordered set of anchor pairs summarizing some state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorMap(Vec<AnchorPair>);

impl AnchorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[AnchorPair] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value stored under `key`, if present.
    pub fn get(&self, key: &B256) -> Option<B256> {
        self.0.iter().find(|p| &p.key == key).map(|p| p.value)
    }

    pub fn into_pairs(self) -> Vec<AnchorPair> {
        self.0
    }
}

impl From<Vec<AnchorPair>> for AnchorMap {
    fn from(pairs: Vec<AnchorPair>) -> Self {
        Self(pairs)
    }
}

impl FromIterator<AnchorPair> for AnchorMap {
    fn from_iter<I: IntoIterator<Item = AnchorPair>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
