//! Message transport through a relay.
//!
//! # Data Flow
//! ```text
//! Client side:
//!     SignedMessage → RelayClient::send → POST /messages
//!     RelayClient::list_summaries → GET /messages/{address}       (no payloads)
//!     RelayClient::fetch_full     → GET /messages/{address}/{hash}
//!     RelayClient::resolve        → GET {content.url} → digest check → inline
//!
//! Reference server side:
//!     POST /messages → verify → (payload > embed limit? store in /files) → MessageStore
//! ```
//!
//! # Design Decisions
//! - The relay never re-signs; externalizing a payload keeps the signature
//!   valid because only the digest and size are signed
//! - An unknown recipient lists as empty
//! - No retries; every request is bounded by the configured timeout

pub mod client;
pub mod server;
pub mod store;
pub mod types;

pub use client::RelayClient;
pub use server::{RelayServer, RelayState};
pub use store::MessageStore;
pub use types::{ListOptions, MessageSummary, RelayStatus, TransportError};
