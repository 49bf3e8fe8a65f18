//! Wallet management and record signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables or explicit input
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, Signer};
use async_trait::async_trait;

use crate::blockchain::signer::RecordSigner;
use crate::blockchain::types::{BlockchainError, BlockchainResult, SigningError};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "EVENT_ANCHOR_PRIVATE_KEY";

/// Local key wallet that signs records and anchor transactions.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Network the wallet is currently pointed at.
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Active network of the wallet
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;
        let signer = signer.with_chain_id(Some(chain_id));

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Wallet initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Load wallet from environment variable.
    ///
    /// Reads `EVENT_ANCHOR_PRIVATE_KEY` from environment.
    pub fn from_env(chain_id: u64) -> BlockchainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            BlockchainError::Wallet(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key, chain_id)
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Network the wallet is currently on.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The same key, pointed at another network.
    pub fn on_chain(&self, chain_id: u64) -> Self {
        Self {
            signer: self.signer.clone().with_chain_id(Some(chain_id)),
            chain_id,
        }
    }

    /// Transaction-signing wallet for provider construction.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }

    /// Sign arbitrary message bytes (with Ethereum prefix).
    pub async fn sign_message(&self, message: &[u8]) -> BlockchainResult<Signature> {
        self.signer
            .sign_message(message)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Message signing failed: {}", e)))
    }
}

#[async_trait]
impl RecordSigner for Wallet {
    fn address(&self) -> Address {
        Wallet::address(self)
    }

    async fn sign_bytes(&self, message: &[u8]) -> Result<Signature, SigningError> {
        self.sign_message(message)
            .await
            .map_err(|e| SigningError::Failed(e.to_string()))
    }
}
