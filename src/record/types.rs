//! Record metadata, payload storage and validation errors.

use alloy::primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors raised while building or validating records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The payload has no bytes.
    #[error("Payload is empty")]
    EmptyPayload,

    /// The media type is not of the form `type/subtype`.
    #[error("Malformed media type: {0:?}")]
    MalformedMediaType(String),

    /// Payload declared as JSON does not parse.
    #[error("Payload is not valid JSON for {media_type}: {reason}")]
    InvalidJson { media_type: String, reason: String },

    /// Payload declared as text is not UTF-8.
    #[error("Payload is not valid UTF-8 text for {media_type}")]
    InvalidText { media_type: String },

    /// A digest was not exactly 32 bytes long.
    #[error("Anchor {field} must be 32 bytes, got {len}")]
    DigestLength { field: &'static str, len: usize },

    /// Downloaded bytes do not match the digest recorded in the record.
    #[error("Payload does not match recorded digest {expected}")]
    DigestMismatch { expected: B256 },

    /// A message was sent without a recipient.
    #[error("Message has no recipient")]
    MissingRecipient,
}

/// Descriptive metadata attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Application-level record type (e.g. "login", "invoice").
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Intended reader of the record, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Address>,
}

impl Meta {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Where the payload bytes of a record live.
///
/// Only the digest and size take part in the signed bytes, so moving a
/// payload out of band keeps the signature valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storage", rename_all = "snake_case")]
pub enum Content {
    /// Payload embedded in the record.
    Inline { data: Bytes },

    /// Payload stored elsewhere and dereferenced by URL.
    External { url: String, digest: B256, size: u64 },
}

impl Content {
    pub fn inline(data: impl Into<Bytes>) -> Self {
        Content::Inline { data: data.into() }
    }

    /// keccak-256 of the payload bytes.
    pub fn digest(&self) -> B256 {
        match self {
            Content::Inline { data } => keccak256(data),
            Content::External { digest, .. } => *digest,
        }
    }

    /// Payload length in bytes.
    pub fn size(&self) -> u64 {
        match self {
            Content::Inline { data } => data.len() as u64,
            Content::External { size, .. } => *size,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Content::External { .. })
    }

    /// Inline payload bytes, `None` when stored externally.
    pub fn data(&self) -> Option<&Bytes> {
        match self {
            Content::Inline { data } => Some(data),
            Content::External { .. } => None,
        }
    }

    /// URL of an externally stored payload.
    pub fn url(&self) -> Option<&str> {
        match self {
            Content::Inline { .. } => None,
            Content::External { url, .. } => Some(url),
        }
    }

    /// Move the payload out of band, keeping digest and size.
    pub fn externalize(self, url: impl Into<String>) -> Self {
        let digest = self.digest();
        let size = self.size();
        Content::External {
            url: url.into(),
            digest,
            size,
        }
    }

    /// Bring downloaded bytes back in band after checking them against the
    /// recorded digest and size.
    pub fn resolve(self, bytes: Bytes) -> Result<Self, ValidationError> {
        match self {
            Content::Inline { .. } => Ok(self),
            Content::External { digest, size, .. } => {
                if bytes.len() as u64 != size || keccak256(&bytes) != digest {
                    return Err(ValidationError::DigestMismatch { expected: digest });
                }
                Ok(Content::Inline { data: bytes })
            }
        }
    }
}

/// Milliseconds since the unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
