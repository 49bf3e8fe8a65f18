//! Relay wire types and transport errors.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::media::MediaType;
use crate::record::message::SignedMessage;
use crate::record::types::{Meta, ValidationError};

/// Errors talking to a relay.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("Relay unreachable: {0}")]
    Unreachable(String),

    /// No response within the configured timeout.
    #[error("Relay request timed out after {0} seconds")]
    Timeout(u64),

    /// The relay answered with a non-success status.
    #[error("Relay returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The requested record does not exist.
    #[error("Message not found")]
    NotFound,

    /// Response body could not be decoded.
    #[error("Invalid relay response: {0}")]
    Decode(String),

    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Listing of a stored message without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub hash: B256,
    pub timestamp: u64,
    pub sender: Address,
    pub recipient: Address,
    pub size: u64,
    pub media_type: MediaType,
    pub stored_externally: bool,
    #[serde(default)]
    pub meta: Meta,
}

impl MessageSummary {
    /// Summary of `message`; `None` when it has no recipient.
    pub fn of(message: &SignedMessage) -> Option<Self> {
        let record = &message.record;
        Some(Self {
            hash: message.hash(),
            timestamp: record.timestamp(),
            sender: record.sender(),
            recipient: record.recipient()?,
            size: record.content().size(),
            media_type: record.media_type().clone(),
            stored_externally: record.content().is_external(),
            meta: record.meta().clone(),
        })
    }
}

/// Pagination for message listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl ListOptions {
    pub fn new(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Liveness response of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatus {
    pub status: String,
    pub version: String,
    #[serde(default)]
    pub messages: usize,
}

/// Response of `POST /messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub hash: B256,
}

/// Error body returned by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
