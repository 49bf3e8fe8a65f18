//! Explicit session handle tying a signer, an anchor backend and a relay
//! together.
//!
//! A session starts disconnected. [`Session::connect_wallet`] installs a
//! wallet and derives its anchor backend from configuration;
//! [`Session::connect`] takes a caller-supplied signer and backend. Wallet
//! notifications are fed in through [`Session::handle`], and a network change
//! rebuilds a wallet-derived backend for the new network.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256};

use crate::anchor::simulated::{SimulatedAnchor, DEFAULT_SIMULATED_MAX_ANCHORS};
use crate::anchor::{AnchorBackend, AnchorClient, AnchorError, AnchorResult, ContractAnchor};
use crate::blockchain::signer::RecordSigner;
use crate::blockchain::types::BlockchainError;
use crate::blockchain::wallet::Wallet;
use crate::chain::EventChain;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::record::{sign_with, Event, MediaType, Message, Meta, SignedEvent, SignedMessage};
use crate::relay::{ListOptions, MessageSummary, RelayClient};

/// Notifications from the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The exposed accounts changed; empty means the wallet disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet switched networks.
    ChainChanged(u64),
}

/// Where a connection's anchor backend comes from.
enum BackendSource {
    /// Supplied by the caller; network changes are only recorded.
    Fixed,
    /// Derived from this wallet and the configuration.
    Wallet(Wallet),
}

struct Connection {
    signer: Arc<dyn RecordSigner>,
    anchor: AnchorClient,
    account: Address,
    active_chain_id: Option<u64>,
    source: BackendSource,
}

/// Everything an application needs between connecting and disconnecting a
/// wallet.
pub struct Session {
    config: AppConfig,
    relay: RelayClient,
    connection: Option<Connection>,
}

impl Session {
    pub fn new(config: AppConfig) -> Result<Self> {
        let relay = RelayClient::new(&config.relay)?;
        Ok(Self {
            config,
            relay,
            connection: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    /// Connect `wallet`, building its anchor backend from configuration.
    pub async fn connect_wallet(&mut self, wallet: Wallet) -> Result<Address> {
        let backend = anchor_backend(&self.config, &wallet)?;
        let signer = Arc::new(wallet.clone());
        self.install(signer, backend, BackendSource::Wallet(wallet)).await
    }

    /// Install `signer` and `backend`, recording the active account and
    /// network.
    pub async fn connect(
        &mut self,
        signer: Arc<dyn RecordSigner>,
        backend: Arc<dyn AnchorBackend>,
    ) -> Result<Address> {
        self.install(signer, backend, BackendSource::Fixed).await
    }

    async fn install(
        &mut self,
        signer: Arc<dyn RecordSigner>,
        backend: Arc<dyn AnchorBackend>,
        source: BackendSource,
    ) -> Result<Address> {
        let account = signer.address();
        let active_chain_id = match backend.active_chain_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read wallet network");
                None
            }
        };

        let anchor = AnchorClient::new(backend, self.config.anchor.target_chain_id);
        tracing::info!(
            account = %account,
            active_chain_id = ?active_chain_id,
            target_chain_id = anchor.target_chain_id(),
            "Session connected"
        );

        self.connection = Some(Connection {
            signer,
            anchor,
            account,
            active_chain_id,
            source,
        });
        Ok(account)
    }

    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            tracing::info!(account = %connection.account, "Session disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Apply a wallet notification.
    ///
    /// A network change on a wallet-derived connection re-initializes the
    /// anchor backend for the new network. If that fails the new network is
    /// still recorded, so anchoring stays refused until the wallet moves to a
    /// usable network.
    pub fn handle(&mut self, event: WalletEvent) -> Result<()> {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                let current = self.connection.as_ref().map(|c| c.account);
                match (accounts.first(), current) {
                    (Some(first), Some(account)) if *first == account => {}
                    (Some(first), Some(_)) => {
                        // The signer cannot act for another account
                        tracing::info!(account = %first, "Wallet account changed");
                        self.disconnect();
                    }
                    (None, _) => self.disconnect(),
                    (Some(_), None) => {}
                }
            }
            WalletEvent::ChainChanged(chain_id) => {
                let target_chain_id = self.config.anchor.target_chain_id;
                let Some(connection) = self.connection.as_mut() else {
                    return Ok(());
                };
                tracing::info!(chain_id = chain_id, "Wallet network changed");
                connection.active_chain_id = Some(chain_id);

                if let BackendSource::Wallet(wallet) = &connection.source {
                    let wallet = wallet.on_chain(chain_id);
                    let backend = anchor_backend(&self.config, &wallet)?;
                    connection.anchor = AnchorClient::new(backend, target_chain_id);
                    connection.signer = Arc::new(wallet.clone());
                    connection.source = BackendSource::Wallet(wallet);
                }
            }
        }
        Ok(())
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection.as_ref().ok_or(Error::NotConnected)
    }

    pub fn account(&self) -> Result<Address> {
        Ok(self.connection()?.account)
    }

    /// Last known wallet network.
    pub fn active_chain_id(&self) -> Result<Option<u64>> {
        Ok(self.connection()?.active_chain_id)
    }

    pub fn signer(&self) -> Result<&dyn RecordSigner> {
        Ok(self.connection()?.signer.as_ref())
    }

    pub fn anchor_client(&self) -> Result<&AnchorClient> {
        Ok(&self.connection()?.anchor)
    }

    /// Empty chain owned by the connected account.
    pub fn new_chain(&self, id: impl Into<String>) -> Result<EventChain> {
        Ok(EventChain::new(id, self.account()?))
    }

    pub async fn append_event(&self, chain: &mut EventChain, event: Event) -> Result<SignedEvent> {
        let signer = self.signer()?;
        Ok(chain.append(event, signer).await?.clone())
    }

    /// Build and sign a message from the connected account to `recipient`.
    pub async fn compose_message(
        &self,
        recipient: Address,
        payload: impl Into<Bytes>,
        media_type: MediaType,
        meta: Option<Meta>,
    ) -> Result<SignedMessage> {
        let signer = self.signer()?;
        let message = Message::create(signer.address(), payload, media_type, meta)?.to(recipient);
        Ok(sign_with(message, signer).await?)
    }

    pub async fn send_message(&self, message: &SignedMessage) -> Result<B256> {
        Ok(self.relay.send(message).await?)
    }

    /// Inbox of the connected account.
    pub async fn inbox(&self, options: Option<ListOptions>) -> Result<Vec<MessageSummary>> {
        let options = options.unwrap_or_else(|| self.relay.default_list_options());
        Ok(self.relay.list_summaries(self.account()?, options).await?)
    }

    fn check_recorded_network(&self, connection: &Connection) -> Result<()> {
        let expected = connection.anchor.target_chain_id();
        match connection.active_chain_id {
            Some(actual) if actual != expected => {
                Err(AnchorError::NetworkMismatch { expected, actual }.into())
            }
            _ => Ok(()),
        }
    }

    pub async fn anchor_chain(&self, chain: &EventChain) -> Result<AnchorResult> {
        let connection = self.connection()?;
        self.check_recorded_network(connection)?;
        Ok(connection.anchor.anchor(&chain.anchor_map()).await?)
    }

    /// Anchor several chains, one transaction per contract-sized chunk.
    pub async fn anchor_chains(&self, chains: &[EventChain]) -> Result<Vec<AnchorResult>> {
        let connection = self.connection()?;
        self.check_recorded_network(connection)?;
        let maps: Vec<_> = chains.iter().map(EventChain::anchor_map).collect();
        Ok(connection.anchor.anchor_many(&maps).await?)
    }

    pub async fn anchor_message(&self, message: &SignedMessage) -> Result<AnchorResult> {
        let connection = self.connection()?;
        self.check_recorded_network(connection)?;
        Ok(connection.anchor.anchor(&message.anchor_map()).await?)
    }
}

/// Anchor backend for `wallet` according to configuration.
///
/// Simulation must be requested explicitly; otherwise the wallet's network
/// has to be configured.
pub fn anchor_backend(config: &AppConfig, wallet: &Wallet) -> Result<Arc<dyn AnchorBackend>> {
    if config.anchor.simulate {
        return Ok(Arc::new(SimulatedAnchor::new(
            wallet.chain_id(),
            DEFAULT_SIMULATED_MAX_ANCHORS,
        )));
    }

    let network = config.network(wallet.chain_id()).ok_or_else(|| {
        BlockchainError::NotAvailable(format!("no network configured for chain {}", wallet.chain_id()))
    })?;
    Ok(Arc::new(ContractAnchor::new(wallet, network, &config.anchor)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorStatus;

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn simulated_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.anchor.simulate = true;
        config
    }

    async fn connected(chain_id: u64) -> (Session, Wallet) {
        let config = simulated_config();
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, chain_id).unwrap();
        let mut session = Session::new(config).unwrap();
        session.connect_wallet(wallet.clone()).await.unwrap();
        (session, wallet)
    }

    #[test]
    fn test_disconnected_accessors() {
        let session = Session::new(AppConfig::default()).unwrap();
        assert!(matches!(session.account(), Err(Error::NotConnected)));
        assert!(matches!(session.anchor_client(), Err(Error::NotConnected)));
        assert!(matches!(session.new_chain("c"), Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_login_event_anchors() {
        let (session, wallet) = connected(84532).await;
        let mut chain = session.new_chain("demo-chain-123").unwrap();

        let event = Event::json(&serde_json::json!({ "action": "login" }), None).unwrap();
        let signed = session.append_event(&mut chain, event).await.unwrap();
        assert!(signed.verify());
        assert_eq!(signed.signer, wallet.address());

        let map = chain.anchor_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.pairs()[0].key, chain.state_key());

        let result = session.anchor_chain(&chain).await.unwrap();
        assert_eq!(result.status(), AnchorStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_wrong_network() {
        let (session, _) = connected(1).await;
        let mut chain = session.new_chain("c").unwrap();
        session
            .append_event(&mut chain, Event::json(&serde_json::json!({}), None).unwrap())
            .await
            .unwrap();

        let err = session.anchor_chain(&chain).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Anchor(AnchorError::NetworkMismatch {
                expected: 84532,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_chain_changed_blocks_anchoring() {
        let (mut session, wallet) = connected(84532).await;
        let message = session
            .compose_message(Address::repeat_byte(5), b"hi".to_vec(), MediaType::text(), None)
            .await
            .unwrap();
        assert_eq!(message.record.sender(), wallet.address());

        session.handle(WalletEvent::ChainChanged(1)).unwrap();
        assert_eq!(session.active_chain_id().unwrap(), Some(1));
        assert!(matches!(
            session.anchor_message(&message).await,
            Err(Error::Anchor(AnchorError::NetworkMismatch { .. }))
        ));

        session.handle(WalletEvent::ChainChanged(84532)).unwrap();
        assert!(session.anchor_message(&message).await.unwrap().success());
    }

    #[tokio::test]
    async fn test_moving_onto_target_network_unblocks_anchoring() {
        let (mut session, _) = connected(1).await;
        let mut chain = session.new_chain("c").unwrap();
        session
            .append_event(&mut chain, Event::json(&serde_json::json!({}), None).unwrap())
            .await
            .unwrap();
        assert!(matches!(
            session.anchor_chain(&chain).await,
            Err(Error::Anchor(AnchorError::NetworkMismatch { actual: 1, .. }))
        ));

        session.handle(WalletEvent::ChainChanged(84532)).unwrap();
        assert_eq!(session.active_chain_id().unwrap(), Some(84532));
        let result = session.anchor_chain(&chain).await.unwrap();
        assert_eq!(result.status(), AnchorStatus::Confirmed);
        assert_eq!(result.anchors(), chain.anchor_map().pairs());
    }

    #[tokio::test]
    async fn test_unconfigured_network_is_recorded_and_refused() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 84532).unwrap();
        let mut config = AppConfig::default();
        config.network_mut(84532).unwrap().rpc_url = "http://127.0.0.1:1".to_string();
        config.anchor.rpc_timeout_secs = 1;
        let mut session = Session::new(config).unwrap();
        session.connect_wallet(wallet).await.unwrap();

        assert!(matches!(
            session.handle(WalletEvent::ChainChanged(1)),
            Err(Error::Blockchain(BlockchainError::NotAvailable(_)))
        ));
        assert!(session.is_connected());
        assert_eq!(session.active_chain_id().unwrap(), Some(1));

        let message = session
            .compose_message(Address::repeat_byte(5), b"hi".to_vec(), MediaType::text(), None)
            .await
            .unwrap();
        assert!(matches!(
            session.anchor_message(&message).await,
            Err(Error::Anchor(AnchorError::NetworkMismatch { expected: 84532, actual: 1 }))
        ));
    }

    #[tokio::test]
    async fn test_fixed_backend_only_records_network() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 84532).unwrap();
        let mut session = Session::new(simulated_config()).unwrap();
        let backend = Arc::new(SimulatedAnchor::new(84532, 4));
        session
            .connect(Arc::new(wallet), backend.clone())
            .await
            .unwrap();

        session.handle(WalletEvent::ChainChanged(1)).unwrap();
        assert_eq!(session.active_chain_id().unwrap(), Some(1));
        assert_eq!(backend.active_chain_id().await.unwrap(), 84532);
    }

    #[tokio::test]
    async fn test_account_events() {
        let (mut session, wallet) = connected(84532).await;

        session
            .handle(WalletEvent::AccountsChanged(vec![wallet.address()]))
            .unwrap();
        assert!(session.is_connected());

        session
            .handle(WalletEvent::AccountsChanged(vec![Address::repeat_byte(1)]))
            .unwrap();
        assert!(!session.is_connected());

        let (mut session, _) = connected(84532).await;
        session.handle(WalletEvent::AccountsChanged(Vec::new())).unwrap();
        assert!(matches!(session.account(), Err(Error::NotConnected)));
    }

    #[test]
    fn test_backend_requires_network_without_simulation() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 1).unwrap();
        assert!(matches!(
            anchor_backend(&AppConfig::default(), &wallet),
            Err(Error::Blockchain(BlockchainError::NotAvailable(_)))
        ));
    }
}
