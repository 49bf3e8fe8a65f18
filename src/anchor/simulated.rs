//! In-memory ledger for explicit simulation mode.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::{keccak256, TxHash, B256};
use async_trait::async_trait;
use dashmap::DashMap;

use crate::anchor::backend::AnchorBackend;
use crate::anchor::types::{AnchorError, AnchorReceipt};
use crate::chain::anchor_map::AnchorPair;

/// Per-transaction limit used when none is given.
pub const DEFAULT_SIMULATED_MAX_ANCHORS: usize = 32;

const BASE_GAS: u64 = 21_000;
const GAS_PER_PAIR: u64 = 25_000;

/// Backend that records pairs in memory and mines them instantly.
///
/// Only used when simulation is requested; never a silent fallback for a
/// missing contract.
pub struct SimulatedAnchor {
    chain_id: u64,
    max_anchors: usize,
    block_number: AtomicU64,
    ledger: DashMap<B256, B256>,
}

impl SimulatedAnchor {
    pub fn new(chain_id: u64, max_anchors: usize) -> Self {
        tracing::warn!(
            chain_id = chain_id,
            max_anchors = max_anchors,
            "Anchoring is SIMULATED: nothing will be written to a real ledger"
        );
        Self {
            chain_id,
            max_anchors,
            block_number: AtomicU64::new(0),
            ledger: DashMap::new(),
        }
    }

    /// Latest value anchored under `key`.
    pub fn anchored(&self, key: &B256) -> Option<B256> {
        self.ledger.get(key).map(|v| *v)
    }

    pub fn anchored_count(&self) -> usize {
        self.ledger.len()
    }
}

#[async_trait]
impl AnchorBackend for SimulatedAnchor {
    async fn active_chain_id(&self) -> Result<u64, AnchorError> {
        Ok(self.chain_id)
    }

    async fn max_anchors(&self) -> Result<usize, AnchorError> {
        Ok(self.max_anchors)
    }

    async fn submit(&self, pairs: &[AnchorPair]) -> Result<AnchorReceipt, AnchorError> {
        // Mirrors the contract's own guard
        if pairs.len() > self.max_anchors {
            return Err(AnchorError::Contract("too many anchors".to_string()));
        }

        let block_number = self.block_number.fetch_add(1, Ordering::SeqCst) + 1;

        let mut preimage = Vec::with_capacity(8 + pairs.len() * 64);
        preimage.extend_from_slice(&block_number.to_be_bytes());
        for pair in pairs {
            preimage.extend_from_slice(pair.key.as_slice());
            preimage.extend_from_slice(pair.value.as_slice());
            self.ledger.insert(pair.key, pair.value);
        }
        let tx_hash: TxHash = keccak256(&preimage);

        tracing::info!(
            tx_hash = %tx_hash,
            block_number = block_number,
            pairs = pairs.len(),
            "Simulated anchor transaction mined"
        );

        Ok(AnchorReceipt {
            tx_hash,
            block_number: Some(block_number),
            gas_used: Some(BASE_GAS + GAS_PER_PAIR * pairs.len() as u64),
            success: true,
            revert_reason: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(n: u8) -> Vec<AnchorPair> {
        (0..n)
            .map(|i| AnchorPair::new(B256::repeat_byte(i), B256::repeat_byte(i.wrapping_add(100))))
            .collect()
    }

    #[tokio::test]
    async fn test_submit_records_pairs() {
        let backend = SimulatedAnchor::new(84532, 4);
        let receipt = backend.submit(&pairs(3)).await.unwrap();

        assert!(receipt.success);
        assert_eq!(receipt.block_number, Some(1));
        assert_eq!(backend.anchored_count(), 3);
        assert_eq!(backend.anchored(&B256::repeat_byte(1)), Some(B256::repeat_byte(101)));
    }

    #[tokio::test]
    async fn test_blocks_increase_and_hashes_differ() {
        let backend = SimulatedAnchor::new(84532, 4);
        let a = backend.submit(&pairs(1)).await.unwrap();
        let b = backend.submit(&pairs(1)).await.unwrap();
        assert_eq!(b.block_number, Some(2));
        assert_ne!(a.tx_hash, b.tx_hash);
    }

    #[tokio::test]
    async fn test_enforces_max_anchors() {
        let backend = SimulatedAnchor::new(84532, 2);
        assert!(matches!(
            backend.submit(&pairs(3)).await,
            Err(AnchorError::Contract(_))
        ));
        assert_eq!(backend.anchored_count(), 0);
    }

    #[tokio::test]
    async fn test_reports_its_network() {
        let backend = SimulatedAnchor::new(1, 2);
        assert_eq!(backend.active_chain_id().await.unwrap(), 1);
        assert_eq!(backend.max_anchors().await.unwrap(), 2);
    }
}
