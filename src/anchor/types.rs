//! Anchor attempt outcomes and errors.

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::anchor_map::AnchorPair;
use crate::record::types::{now_millis, ValidationError};

/// Errors that stop an anchor attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    /// The wallet is on another network than the anchor target.
    /// Recoverable by switching networks.
    #[error("Wallet is on chain {actual}, anchoring requires chain {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },

    /// The user declined to sign the transaction. Not an error, not retried.
    #[error("Anchor transaction rejected by user")]
    Rejected,

    /// More pairs than the contract accepts in one transaction.
    #[error("{requested} anchors exceed the contract limit of {max} per transaction")]
    CapacityExceeded { requested: usize, max: usize },

    /// Nothing to anchor.
    #[error("Anchor map is empty")]
    Empty,

    /// Another anchor submission is still in flight.
    #[error("An anchor transaction is already in flight")]
    InFlight,

    /// The contract call failed or reverted.
    #[error("Contract error: {0}")]
    Contract(String),

    /// RPC transport failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out before a transaction was sent.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction sent but not mined in time; outcome unknown.
    #[error("Transaction {tx_hash} not confirmed after {after_secs} seconds")]
    Unconfirmed { tx_hash: TxHash, after_secs: u64 },

    /// No anchor contract is known for the network.
    #[error("No anchor contract configured for chain {0}")]
    NoContract(u64),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AnchorError {
    /// Status of an attempt that ended with this error.
    pub fn status(&self) -> AnchorStatus {
        match self {
            AnchorError::Rejected => AnchorStatus::Cancelled,
            _ => AnchorStatus::Failed,
        }
    }
}

/// Final state of one anchor attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStatus {
    /// Mined and succeeded.
    Confirmed,
    /// Mined and reverted.
    Reverted,
    /// Failed before or while submitting.
    Failed,
    /// Declined by the user.
    Cancelled,
}

/// What a backend reports for a mined anchor transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    pub success: bool,
    pub revert_reason: Option<String>,
}

/// Outcome of a single anchor attempt.
///
/// Created once per attempt and never updated; retrying produces a new
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorResult {
    status: AnchorStatus,
    anchors: Vec<AnchorPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tx_hash: Option<TxHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    attempted_at: u64,
}

impl AnchorResult {
    pub(crate) fn from_receipt(anchors: Vec<AnchorPair>, receipt: AnchorReceipt) -> Self {
        let status = if receipt.success {
            AnchorStatus::Confirmed
        } else {
            AnchorStatus::Reverted
        };
        let error = match status {
            AnchorStatus::Reverted => Some(
                receipt
                    .revert_reason
                    .unwrap_or_else(|| "Transaction reverted".to_string()),
            ),
            _ => None,
        };

        Self {
            status,
            anchors,
            tx_hash: Some(receipt.tx_hash),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            error,
            attempted_at: now_millis(),
        }
    }

    pub(crate) fn from_error(anchors: Vec<AnchorPair>, error: &AnchorError) -> Self {
        let status = error.status();
        let tx_hash = match error {
            AnchorError::Unconfirmed { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        };

        Self {
            status,
            anchors,
            tx_hash,
            block_number: None,
            gas_used: None,
            error: Some(error.to_string()),
            attempted_at: now_millis(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == AnchorStatus::Confirmed
    }

    pub fn status(&self) -> AnchorStatus {
        self.status
    }

    pub fn anchors(&self) -> &[AnchorPair] {
        &self.anchors
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        self.tx_hash
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    pub fn gas_used(&self) -> Option<u64> {
        self.gas_used
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Unix milliseconds when the attempt finished.
    pub fn attempted_at(&self) -> u64 {
        self.attempted_at
    }
}
