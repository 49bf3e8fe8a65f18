//! In-memory message store of the reference relay.

use std::cmp::Reverse;

use alloy::primitives::{Address, Bytes, B256};
use dashmap::DashMap;

use crate::record::message::SignedMessage;
use crate::relay::types::{ListOptions, MessageSummary};

/// Append-only store keyed by recipient, plus out-of-band payloads.
#[derive(Debug, Default)]
pub struct MessageStore {
    inbox: DashMap<Address, Vec<(B256, SignedMessage)>>,
    files: DashMap<B256, Bytes>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `message` for `recipient` and return its hash.
    ///
    /// Storing the same record twice keeps a single copy.
    pub fn insert(&self, recipient: Address, message: SignedMessage) -> B256 {
        let hash = message.hash();
        let mut entries = self.inbox.entry(recipient).or_default();
        if !entries.iter().any(|(h, _)| *h == hash) {
            entries.push((hash, message));
        }
        hash
    }

    /// Keep payload bytes addressable by digest.
    pub fn put_file(&self, digest: B256, bytes: Bytes) {
        self.files.insert(digest, bytes);
    }

    pub fn file(&self, digest: &B256) -> Option<Bytes> {
        self.files.get(digest).map(|b| b.clone())
    }

    pub fn get(&self, recipient: &Address, hash: &B256) -> Option<SignedMessage> {
        self.inbox.get(recipient).and_then(|entries| {
            entries
                .iter()
                .find(|(h, _)| h == hash)
                .map(|(_, m)| m.clone())
        })
    }

    /// Summaries for `recipient`, newest first.
    pub fn summaries(&self, recipient: &Address, options: ListOptions) -> Vec<MessageSummary> {
        let Some(entries) = self.inbox.get(recipient) else {
            return Vec::new();
        };

        // Later arrivals win ties on timestamp
        let mut summaries: Vec<MessageSummary> = entries
            .iter()
            .rev()
            .filter_map(|(_, m)| MessageSummary::of(m))
            .collect();
        summaries.sort_by_key(|s| Reverse(s.timestamp));

        summaries
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect()
    }

    /// Total number of stored messages.
    pub fn len(&self) -> usize {
        self.inbox.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::wallet::Wallet;
    use crate::record::media::MediaType;
    use crate::record::message::Message;
    use crate::record::signed::sign_with;

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    async fn message(wallet: &Wallet, to: Address, text: &str, ts: u64) -> SignedMessage {
        let msg = Message::create(wallet.address(), text.as_bytes().to_vec(), MediaType::text(), None)
            .unwrap()
            .to(to)
            .with_timestamp(ts);
        sign_with(msg, wallet).await.unwrap()
    }

    #[tokio::test]
    async fn test_newest_first_with_pagination() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 84532).unwrap();
        let to = Address::repeat_byte(7);
        let store = MessageStore::new();

        let old = store.insert(to, message(&wallet, to, "old", 1).await);
        let new = store.insert(to, message(&wallet, to, "new", 3).await);
        let mid = store.insert(to, message(&wallet, to, "mid", 2).await);

        let all = store.summaries(&to, ListOptions::new(10));
        let hashes: Vec<B256> = all.iter().map(|s| s.hash).collect();
        assert_eq!(hashes, vec![new, mid, old]);

        let page = store.summaries(&to, ListOptions::new(1).offset(1));
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].hash, mid);
    }

    #[tokio::test]
    async fn test_unknown_recipient_is_empty() {
        let store = MessageStore::new();
        assert!(store.summaries(&Address::ZERO, ListOptions::new(10)).is_empty());
        assert!(store.get(&Address::ZERO, &B256::ZERO).is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 84532).unwrap();
        let to = Address::repeat_byte(7);
        let store = MessageStore::new();
        let msg = message(&wallet, to, "once", 1).await;

        let a = store.insert(to, msg.clone());
        let b = store.insert(to, msg);
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert!(store.get(&to, &a).is_some());
    }
}
