//! Append-only, hash-linked event chains.

use alloy::primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::signer::RecordSigner;
use crate::blockchain::types::SigningError;
use crate::chain::anchor_map::{AnchorMap, AnchorPair};
use crate::record::event::{Event, SignedEvent};
use crate::record::signed::sign_with;

const GENESIS_DOMAIN: &[u8] = b"event-anchor/genesis";
const STATE_DOMAIN: &[u8] = b"event-anchor/state";

/// Structural violations when appending to a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainStateError {
    /// Event belongs to another chain (or to none).
    #[error("Event chain id {actual:?} does not match chain {expected}")]
    ChainIdMismatch {
        expected: String,
        actual: Option<String>,
    },

    /// Event does not link to the current head.
    #[error("Event links to {actual:?}, expected previous {expected}")]
    BrokenLink {
        expected: B256,
        actual: Option<B256>,
    },

    /// Signature does not verify.
    #[error("Event signature is invalid")]
    InvalidSignature,

    /// Event was signed by someone other than the chain owner.
    #[error("Event signed by {signer}, chain is owned by {owner}")]
    ForeignSigner { owner: Address, signer: Address },
}

/// Errors from [`EventChain::append`].
#[derive(Debug, Error)]
pub enum AppendError {
    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Chain(#[from] ChainStateError),
}

/// Ordered sequence of signed events owned by one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventChain {
    id: String,
    owner: Address,
    events: Vec<SignedEvent>,
}

impl EventChain {
    pub fn new(id: impl Into<String>, owner: Address) -> Self {
        Self {
            id: id.into(),
            owner,
            events: Vec::new(),
        }
    }

    /// Rebuild a chain from stored events, re-checking every link and
    /// signature.
    pub fn from_events(
        id: impl Into<String>,
        owner: Address,
        events: impl IntoIterator<Item = SignedEvent>,
    ) -> Result<Self, ChainStateError> {
        let mut chain = Self::new(id, owner);
        for event in events {
            chain.add_event(event)?;
        }
        Ok(chain)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn events(&self) -> &[SignedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Link target of the first event.
    pub fn genesis_hash(&self) -> B256 {
        keccak256([GENESIS_DOMAIN, self.id.as_bytes()].concat())
    }

    /// Hash the next event must link to.
    pub fn head(&self) -> B256 {
        self.events
            .last()
            .map(SignedEvent::hash)
            .unwrap_or_else(|| self.genesis_hash())
    }

    /// Position `event` at the end of this chain, ready for signing.
    pub fn link(&self, event: Event) -> Event {
        event.linked(&self.id, self.head())
    }

    /// Append a signed event.
    pub fn add_event(&mut self, event: SignedEvent) -> Result<(), ChainStateError> {
        if event.record.chain_id() != Some(self.id.as_str()) {
            return Err(ChainStateError::ChainIdMismatch {
                expected: self.id.clone(),
                actual: event.record.chain_id().map(str::to_string),
            });
        }

        let head = self.head();
        if event.record.previous() != Some(head) {
            return Err(ChainStateError::BrokenLink {
                expected: head,
                actual: event.record.previous(),
            });
        }

        if event.signer != self.owner {
            return Err(ChainStateError::ForeignSigner {
                owner: self.owner,
                signer: event.signer,
            });
        }

        if !event.verify() {
            return Err(ChainStateError::InvalidSignature);
        }

        tracing::debug!(
            chain_id = %self.id,
            position = self.events.len(),
            hash = %event.hash(),
            "Event appended"
        );
        self.events.push(event);
        Ok(())
    }

    /// Link, sign and append in one step.
    pub async fn append(
        &mut self,
        event: Event,
        signer: &dyn RecordSigner,
    ) -> Result<&SignedEvent, AppendError> {
        let signed = sign_with(self.link(event), signer).await?;
        let position = self.events.len();
        self.add_event(signed)?;
        Ok(&self.events[position])
    }

    /// Fixed key under which the latest state is anchored.
    pub fn state_key(&self) -> B256 {
        keccak256([STATE_DOMAIN, self.id.as_bytes()].concat())
    }

    /// Running hash over all event hashes, seeded with the genesis hash.
    pub fn state_hash(&self) -> B256 {
        self.events.iter().fold(self.genesis_hash(), |state, event| {
            keccak256([state.as_slice(), event.hash().as_slice()].concat())
        })
    }

    /// Digest pairs summarizing the current chain state.
    ///
    /// Empty for a chain without events; otherwise a single
    /// `state_key → state_hash` entry.
    pub fn anchor_map(&self) -> AnchorMap {
        if self.events.is_empty() {
            return AnchorMap::new();
        }
        AnchorMap::from(vec![AnchorPair::new(self.state_key(), self.state_hash())])
    }
}

/// Unchecked wire form, validated on the way in.
#[derive(Deserialize)]
struct StoredChain {
    id: String,
    owner: Address,
    #[serde(default)]
    events: Vec<SignedEvent>,
}

impl<'de> Deserialize<'de> for EventChain {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = StoredChain::deserialize(deserializer)?;
        EventChain::from_events(stored.id, stored.owner, stored.events)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::wallet::Wallet;
    use crate::record::media::MediaType;

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const OTHER_PRIVATE_KEY: &str =
        "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn wallet() -> Wallet {
        Wallet::from_private_key(TEST_PRIVATE_KEY, 84532).unwrap()
    }

    fn event(n: u64) -> Event {
        Event::json(&serde_json::json!({ "n": n }), None)
            .unwrap()
            .with_timestamp(1_700_000_000_000 + n)
    }

    #[test]
    fn test_empty_chain_has_empty_anchor_map() {
        let chain = EventChain::new("demo-chain-123", wallet().address());
        assert!(chain.anchor_map().is_empty());
        assert_eq!(chain.head(), chain.genesis_hash());
        assert_eq!(chain.state_hash(), chain.genesis_hash());
    }

    #[tokio::test]
    async fn test_append_links_events() {
        let wallet = wallet();
        let mut chain = EventChain::new("demo-chain-123", wallet.address());

        let first = chain.append(event(1), &wallet).await.unwrap().clone();
        assert_eq!(first.record.previous(), Some(chain.genesis_hash()));
        assert_eq!(first.record.chain_id(), Some("demo-chain-123"));

        let second = chain.append(event(2), &wallet).await.unwrap().clone();
        assert_eq!(second.record.previous(), Some(first.hash()));
        assert_eq!(chain.len(), 2);
    }

    #[tokio::test]
    async fn test_anchor_map_is_pure_and_state_sensitive() {
        let wallet = wallet();
        let mut chain = EventChain::new("c", wallet.address());
        chain.append(event(1), &wallet).await.unwrap();

        let a = chain.anchor_map();
        let b = chain.anchor_map();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert_eq!(a.pairs()[0].key, chain.state_key());

        chain.append(event(2), &wallet).await.unwrap();
        let c = chain.anchor_map();
        assert_eq!(c.pairs()[0].key, a.pairs()[0].key);
        assert_ne!(c.pairs()[0].value, a.pairs()[0].value);
    }

    #[tokio::test]
    async fn test_rejects_wrong_chain_id() {
        let wallet = wallet();
        let other = EventChain::new("other", wallet.address());
        let signed = sign_with(other.link(event(1)), &wallet).await.unwrap();

        let mut chain = EventChain::new("mine", wallet.address());
        let err = chain.add_event(signed).unwrap_err();
        assert!(matches!(err, ChainStateError::ChainIdMismatch { .. }));
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unlinked_event() {
        let wallet = wallet();
        let mut chain = EventChain::new("c", wallet.address());
        let unlinked = sign_with(event(1), &wallet).await.unwrap();
        assert!(matches!(
            chain.add_event(unlinked).unwrap_err(),
            ChainStateError::ChainIdMismatch { actual: None, .. }
        ));

        // Linked against a stale head
        let stale = sign_with(chain.link(event(1)), &wallet).await.unwrap();
        chain.append(event(2), &wallet).await.unwrap();
        assert!(matches!(
            chain.add_event(stale).unwrap_err(),
            ChainStateError::BrokenLink { .. }
        ));
    }

    #[tokio::test]
    async fn test_rejects_foreign_signer() {
        let owner = wallet();
        let intruder = Wallet::from_private_key(OTHER_PRIVATE_KEY, 84532).unwrap();
        let mut chain = EventChain::new("c", owner.address());

        let err = chain.append(event(1), &intruder).await.unwrap_err();
        assert!(matches!(
            err,
            AppendError::Chain(ChainStateError::ForeignSigner { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejects_tampered_event() {
        let wallet = wallet();
        let mut chain = EventChain::new("c", wallet.address());
        let mut signed = sign_with(chain.link(event(1)), &wallet).await.unwrap();
        signed.signature = alloy::primitives::Bytes::from(vec![0u8; 65]);
        assert_eq!(
            chain.add_event(signed).unwrap_err(),
            ChainStateError::InvalidSignature
        );
    }

    #[tokio::test]
    async fn test_serde_revalidates() {
        let wallet = wallet();
        let mut chain = EventChain::new("c", wallet.address());
        chain.append(event(1), &wallet).await.unwrap();
        chain.append(event(2), &wallet).await.unwrap();

        let json = serde_json::to_string(&chain).unwrap();
        let restored: EventChain = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, chain);
        assert_eq!(restored.anchor_map(), chain.anchor_map());

        // Dropping the first event breaks the link of the second
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["events"].as_array_mut().unwrap().remove(0);
        assert!(serde_json::from_value::<EventChain>(value).is_err());
    }

    #[tokio::test]
    async fn test_text_events() {
        let wallet = wallet();
        let mut chain = EventChain::new("c", wallet.address());
        let event = Event::create(b"plain".to_vec(), MediaType::text(), None).unwrap();
        chain.append(event, &wallet).await.unwrap();
        assert_eq!(chain.anchor_map().len(), 1);
    }
}
