//! Chain events.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::record::canonical::CanonicalWriter;
use crate::record::media::MediaType;
use crate::record::signed::{Canonical, Signed};
use crate::record::types::{now_millis, Content, Meta, ValidationError};

const EVENT_DOMAIN: &str = "event-anchor/event/v1";

/// An immutable event payload, optionally positioned in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous: Option<B256>,
    media_type: MediaType,
    content: Content,
    #[serde(default)]
    meta: Meta,
    timestamp: u64,
}

/// An event with its author's signature.
pub type SignedEvent = Signed<Event>;

impl Event {
    /// Build an event from a payload, validating it against `media_type`.
    pub fn create(
        payload: impl Into<Bytes>,
        media_type: MediaType,
        meta: Option<Meta>,
    ) -> Result<Self, ValidationError> {
        let payload = payload.into();
        media_type.validate_payload(&payload)?;

        Ok(Self {
            chain_id: None,
            previous: None,
            media_type,
            content: Content::inline(payload),
            meta: meta.unwrap_or_default(),
            timestamp: now_millis(),
        })
    }

    /// Build a JSON event from a serializable value.
    pub fn json<T: Serialize>(value: &T, meta: Option<Meta>) -> Result<Self, ValidationError> {
        let payload = serde_json::to_vec(value).map_err(|e| ValidationError::InvalidJson {
            media_type: MediaType::JSON.to_string(),
            reason: e.to_string(),
        })?;
        Self::create(payload, MediaType::json(), meta)
    }

    /// Override the creation timestamp (unix milliseconds).
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach a chain position. The payload is not touched.
    pub(crate) fn linked(mut self, chain_id: &str, previous: B256) -> Self {
        self.chain_id = Some(chain_id.to_string());
        self.previous = Some(previous);
        self
    }

    pub fn chain_id(&self) -> Option<&str> {
        self.chain_id.as_deref()
    }

    pub fn previous(&self) -> Option<B256> {
        self.previous
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Decode a JSON payload.
    pub fn json_value(&self) -> Option<serde_json::Value> {
        if !self.media_type.is_json() {
            return None;
        }
        self.content
            .data()
            .and_then(|data| serde_json::from_slice(data).ok())
    }
}

impl Canonical for Event {
    const KIND: &'static str = "event";

    fn canonical_bytes(&self, signer: &Address) -> Vec<u8> {
        CanonicalWriter::new(EVENT_DOMAIN)
            .opt(self.chain_id.as_deref(), |w, v| w.str(v))
            .opt(self.previous.as_ref(), |w, v| w.digest(v))
            .str(self.media_type.as_str())
            .content(&self.content)
            .meta(&self.meta)
            .u64(self.timestamp)
            .address(signer)
            .finish()
    }
}
