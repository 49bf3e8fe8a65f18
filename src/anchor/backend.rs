//! Seam between the anchor client and whatever commits the pairs.

use async_trait::async_trait;

use crate::anchor::types::{AnchorError, AnchorReceipt};
use crate::chain::anchor_map::AnchorPair;

/// Something that can commit anchor pairs in a transaction.
#[async_trait]
pub trait AnchorBackend: Send + Sync {
    /// Network the signing wallet is currently on.
    async fn active_chain_id(&self) -> Result<u64, AnchorError>;

    /// Maximum number of pairs accepted per transaction.
    async fn max_anchors(&self) -> Result<usize, AnchorError>;

    /// Submit `pairs` in a single transaction and wait for it to be mined.
    async fn submit(&self, pairs: &[AnchorPair]) -> Result<AnchorReceipt, AnchorError>;
}
