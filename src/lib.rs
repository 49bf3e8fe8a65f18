//! Signed, hash-linked event records anchored to a public ledger, and signed
//! messages exchanged through a relay.

// Records and signing
pub mod blockchain;
pub mod chain;
pub mod record;

// Anchoring and transport
pub mod anchor;
pub mod relay;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub mod session;

pub use config::schema::AppConfig;
pub use error::{Error, Result};
pub use lifecycle::Shutdown;
pub use session::{Session, WalletEvent};
