//! Anchoring digest pairs to a public ledger.
//!
//! # Data Flow
//! ```text
//! AnchorMap (from an EventChain or a SignedMessage)
//!     → AnchorClient::anchor / anchor_many
//!         1. non-empty
//!         2. wallet network == target network
//!         3. pairs <= max_anchors (anchor) or chunked (anchor_many)
//!     → AnchorBackend::submit
//!         ContractAnchor  (alloy contract call, waits for the receipt)
//!         SimulatedAnchor (in-memory, only when simulation is enabled)
//!     → AnchorResult (one per transaction, never mutated)
//! ```
//!
//! # Design Decisions
//! - The network is checked before anything is sent
//! - Oversized maps are rejected by `anchor`, never truncated
//! - Nothing is retried automatically; a confirmation timeout leaves the
//!   outcome unknown and is reported with its transaction hash
//! - Simulation is an explicit mode, not a fallback for a missing contract

pub mod backend;
pub mod client;
pub mod contract;
pub mod simulated;
pub mod types;

pub use backend::AnchorBackend;
pub use client::AnchorClient;
pub use contract::ContractAnchor;
pub use simulated::SimulatedAnchor;
pub use types::{AnchorError, AnchorReceipt, AnchorResult, AnchorStatus};
