//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key, RPC URL)
//!     → wallet.rs (key loading, record + transaction signing)
//!     → signer.rs (signer seam, signature verification)
//!     → client.rs (RPC connection with timeouts)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod signer;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use signer::{verify_signature, RecordSigner};
pub use types::{BlockchainError, ChainId, SigningError};
pub use wallet::Wallet;
