//! Anchor submission with network and capacity checks.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::anchor::backend::AnchorBackend;
use crate::anchor::types::{AnchorError, AnchorResult, AnchorStatus};
use crate::chain::anchor_map::{AnchorMap, AnchorPair};
use crate::observability::metrics;

/// Submits anchor maps to a backend on a fixed target network.
pub struct AnchorClient {
    backend: Arc<dyn AnchorBackend>,
    target_chain_id: u64,
    /// Held for the duration of a submission.
    in_flight: Mutex<()>,
}

impl AnchorClient {
    pub fn new(backend: Arc<dyn AnchorBackend>, target_chain_id: u64) -> Self {
        Self {
            backend,
            target_chain_id,
            in_flight: Mutex::new(()),
        }
    }

    pub fn target_chain_id(&self) -> u64 {
        self.target_chain_id
    }

    pub fn backend(&self) -> &Arc<dyn AnchorBackend> {
        &self.backend
    }

    /// Fail with [`AnchorError::NetworkMismatch`] unless the wallet is on the
    /// target network.
    pub async fn check_network(&self) -> Result<(), AnchorError> {
        let actual = self.backend.active_chain_id().await?;
        if actual != self.target_chain_id {
            tracing::warn!(
                expected = self.target_chain_id,
                actual = actual,
                "Wallet is on the wrong network for anchoring"
            );
            return Err(AnchorError::NetworkMismatch {
                expected: self.target_chain_id,
                actual,
            });
        }
        Ok(())
    }

    async fn capacity(&self) -> Result<usize, AnchorError> {
        match self.backend.max_anchors().await? {
            0 => Err(AnchorError::Contract(
                "contract accepts no anchors per transaction".to_string(),
            )),
            max => Ok(max),
        }
    }

    /// Commit every pair of `map` in one transaction.
    ///
    /// A transaction that is mined but reverts is returned as `Ok` with a
    /// `Reverted` status; failures before a receipt exists are `Err`.
    pub async fn anchor(&self, map: &AnchorMap) -> Result<AnchorResult, AnchorError> {
        if map.is_empty() {
            return Err(AnchorError::Empty);
        }
        let _guard = self.in_flight.try_lock().map_err(|_| AnchorError::InFlight)?;

        self.check_network().await?;

        let max = self.capacity().await?;
        if map.len() > max {
            return Err(AnchorError::CapacityExceeded {
                requested: map.len(),
                max,
            });
        }

        let pairs = map.pairs().to_vec();
        match self.backend.submit(&pairs).await {
            Ok(receipt) => {
                let result = AnchorResult::from_receipt(pairs, receipt);
                log_result(&result);
                metrics::record_anchor(result.status(), result.anchors().len());
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, pairs = pairs.len(), "Anchor submission failed");
                metrics::record_anchor(e.status(), 0);
                Err(e)
            }
        }
    }

    /// Commit the pairs of several maps, split into as many transactions as
    /// the contract limit requires.
    ///
    /// One result per transaction. A user rejection stops the remaining
    /// chunks; any other failure is recorded and the next chunk proceeds.
    pub async fn anchor_many(&self, maps: &[AnchorMap]) -> Result<Vec<AnchorResult>, AnchorError> {
        let pairs: Vec<AnchorPair> = maps
            .iter()
            .flat_map(|map| map.pairs().iter().copied())
            .collect();
        if pairs.is_empty() {
            return Err(AnchorError::Empty);
        }
        let _guard = self.in_flight.try_lock().map_err(|_| AnchorError::InFlight)?;

        self.check_network().await?;
        let max = self.capacity().await?;

        let chunk_count = pairs.len().div_ceil(max);
        tracing::info!(
            pairs = pairs.len(),
            max_per_tx = max,
            transactions = chunk_count,
            "Anchoring batch"
        );

        let mut results = Vec::with_capacity(chunk_count);
        for (index, chunk) in pairs.chunks(max).enumerate() {
            let result = match self.backend.submit(chunk).await {
                Ok(receipt) => AnchorResult::from_receipt(chunk.to_vec(), receipt),
                Err(e) => {
                    tracing::warn!(chunk = index, error = %e, "Anchor chunk failed");
                    AnchorResult::from_error(chunk.to_vec(), &e)
                }
            };
            log_result(&result);
            metrics::record_anchor(result.status(), result.anchors().len());

            let cancelled = result.status() == AnchorStatus::Cancelled;
            results.push(result);
            if cancelled {
                tracing::info!(
                    remaining = chunk_count - index - 1,
                    "Anchoring cancelled by user, skipping remaining chunks"
                );
                break;
            }
        }

        Ok(results)
    }
}

fn log_result(result: &AnchorResult) {
    if result.success() {
        tracing::info!(
            tx_hash = ?result.tx_hash(),
            block_number = ?result.block_number(),
            gas_used = ?result.gas_used(),
            pairs = result.anchors().len(),
            "Anchor confirmed"
        );
    } else {
        tracing::warn!(
            status = ?result.status(),
            tx_hash = ?result.tx_hash(),
            error = ?result.error(),
            "Anchor not confirmed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::simulated::SimulatedAnchor;
    use crate::anchor::types::AnchorReceipt;
    use alloy::primitives::{TxHash, B256};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn map(start: u8, n: u8) -> AnchorMap {
        (start..start + n)
            .map(|i| AnchorPair::new(B256::repeat_byte(i), B256::repeat_byte(i)))
            .collect()
    }

    /// Fails submissions according to a script, one entry per call.
    struct ScriptedBackend {
        script: Vec<Option<AnchorError>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnchorBackend for ScriptedBackend {
        async fn active_chain_id(&self) -> Result<u64, AnchorError> {
            Ok(84532)
        }

        async fn max_anchors(&self) -> Result<usize, AnchorError> {
            Ok(2)
        }

        async fn submit(&self, _pairs: &[AnchorPair]) -> Result<AnchorReceipt, AnchorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.get(call).cloned().flatten() {
                Some(err) => Err(err),
                None => Ok(AnchorReceipt {
                    tx_hash: TxHash::repeat_byte(call as u8),
                    block_number: Some(call as u64),
                    gas_used: Some(1),
                    success: true,
                    revert_reason: None,
                }),
            }
        }
    }

    fn scripted(script: Vec<Option<AnchorError>>) -> (Arc<ScriptedBackend>, AnchorClient) {
        let backend = Arc::new(ScriptedBackend {
            script,
            calls: AtomicUsize::new(0),
        });
        let client = AnchorClient::new(backend.clone(), 84532);
        (backend, client)
    }

    #[tokio::test]
    async fn test_anchor_confirms() {
        let backend = Arc::new(SimulatedAnchor::new(84532, 4));
        let client = AnchorClient::new(backend.clone(), 84532);

        let result = client.anchor(&map(1, 2)).await.unwrap();
        assert!(result.success());
        assert_eq!(result.anchors().len(), 2);
        assert_eq!(backend.anchored(&B256::repeat_byte(2)), Some(B256::repeat_byte(2)));
    }

    #[tokio::test]
    async fn test_empty_map() {
        let client = AnchorClient::new(Arc::new(SimulatedAnchor::new(84532, 4)), 84532);
        assert_eq!(client.anchor(&AnchorMap::new()).await.unwrap_err(), AnchorError::Empty);
        assert_eq!(
            client.anchor_many(&[AnchorMap::new()]).await.unwrap_err(),
            AnchorError::Empty
        );
    }

    #[tokio::test]
    async fn test_network_mismatch_before_submission() {
        let backend = Arc::new(SimulatedAnchor::new(1, 4));
        let client = AnchorClient::new(backend.clone(), 84532);

        let err = client.anchor(&map(1, 1)).await.unwrap_err();
        assert_eq!(
            err,
            AnchorError::NetworkMismatch {
                expected: 84532,
                actual: 1
            }
        );
        assert_eq!(backend.anchored_count(), 0);
    }

    #[tokio::test]
    async fn test_anchor_rejects_oversized_map() {
        let backend = Arc::new(SimulatedAnchor::new(84532, 2));
        let client = AnchorClient::new(backend.clone(), 84532);

        let err = client.anchor(&map(1, 3)).await.unwrap_err();
        assert_eq!(err, AnchorError::CapacityExceeded { requested: 3, max: 2 });
        assert_eq!(backend.anchored_count(), 0);
    }

    #[tokio::test]
    async fn test_anchor_many_chunks() {
        let backend = Arc::new(SimulatedAnchor::new(84532, 2));
        let client = AnchorClient::new(backend.clone(), 84532);

        let results = client.anchor_many(&[map(1, 3), map(10, 2)]).await.unwrap();
        let sizes: Vec<usize> = results.iter().map(|r| r.anchors().len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(results.iter().all(AnchorResult::success));
        assert_eq!(backend.anchored_count(), 5);
    }

    #[tokio::test]
    async fn test_anchor_many_continues_after_failure() {
        let (backend, client) = scripted(vec![None, Some(AnchorError::Rpc("boom".into())), None]);

        let results = client.anchor_many(&[map(1, 6)]).await.unwrap();
        let statuses: Vec<AnchorStatus> = results.iter().map(AnchorResult::status).collect();
        assert_eq!(
            statuses,
            vec![AnchorStatus::Confirmed, AnchorStatus::Failed, AnchorStatus::Confirmed]
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_anchor_many_stops_on_rejection() {
        let (backend, client) = scripted(vec![None, Some(AnchorError::Rejected)]);

        let results = client.anchor_many(&[map(1, 6)]).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status(), AnchorStatus::Cancelled);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejection_propagates_from_anchor() {
        let (_backend, client) = scripted(vec![Some(AnchorError::Rejected)]);
        assert_eq!(client.anchor(&map(1, 1)).await.unwrap_err(), AnchorError::Rejected);
    }
}
