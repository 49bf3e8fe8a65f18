//! Messages exchanged through a relay.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::chain::anchor_map::{AnchorMap, AnchorPair};
use crate::record::canonical::CanonicalWriter;
use crate::record::media::MediaType;
use crate::record::signed::{Canonical, Signed};
use crate::record::types::{now_millis, Content, Meta, ValidationError};

const MESSAGE_DOMAIN: &str = "event-anchor/message/v1";

/// An immutable message from `sender`, optionally addressed to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recipient: Option<Address>,
    media_type: MediaType,
    content: Content,
    #[serde(default)]
    meta: Meta,
    timestamp: u64,
}

/// A message with its sender's signature.
pub type SignedMessage = Signed<Message>;

impl Message {
    pub fn create(
        sender: Address,
        payload: impl Into<Bytes>,
        media_type: MediaType,
        meta: Option<Meta>,
    ) -> Result<Self, ValidationError> {
        let payload = payload.into();
        media_type.validate_payload(&payload)?;
        let meta = meta.unwrap_or_default();

        Ok(Self {
            sender,
            recipient: meta.recipient,
            media_type,
            content: Content::inline(payload),
            meta,
            timestamp: now_millis(),
        })
    }

    /// Address the message to `recipient`.
    pub fn to(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self.meta.recipient = Some(recipient);
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn recipient(&self) -> Option<Address> {
        self.recipient
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

    /// Move the payload out of band. The signature stays valid.
    pub fn externalize(mut self, url: impl Into<String>) -> Self {
        self.content = self.content.externalize(url);
        self
    }

    /// Inline previously downloaded payload bytes.
    pub fn resolve(mut self, bytes: Bytes) -> Result<Self, ValidationError> {
        self.content = self.content.resolve(bytes)?;
        Ok(self)
    }
}

impl Canonical for Message {
    const KIND: &'static str = "message";

    fn canonical_bytes(&self, signer: &Address) -> Vec<u8> {
        CanonicalWriter::new(MESSAGE_DOMAIN)
            .address(&self.sender)
            .opt(self.recipient.as_ref(), |w, v| w.address(v))
            .str(self.media_type.as_str())
            .content(&self.content)
            .meta(&self.meta)
            .u64(self.timestamp)
            .address(signer)
            .finish()
    }

    fn declared_author(&self) -> Option<Address> {
        Some(self.sender)
    }
}

impl Signed<Message> {
    /// Anchor map for a single message: its hash against a zero value.
    pub fn anchor_map(&self) -> AnchorMap {
        AnchorMap::from(vec![AnchorPair::new(self.hash(), B256::ZERO)])
    }

    /// Move the payload to `url`, keeping the signature.
    pub fn externalize(self, url: impl Into<String>) -> Self {
        Signed {
            record: self.record.externalize(url),
            signer: self.signer,
            signature: self.signature,
        }
    }

    /// Replace the content with downloaded bytes, keeping the signature.
    pub fn resolve(self, bytes: Bytes) -> Result<Self, ValidationError> {
        Ok(Signed {
            record: self.record.resolve(bytes)?,
            signer: self.signer,
            signature: self.signature,
        })
    }
}
