//! Event chains and anchor maps.
//!
//! # Data Flow
//! ```text
//! Event
//!     → EventChain::link (chain id + previous hash attached)
//!     → sign_with (owner signature)
//!     → EventChain::add_event (chain id, link, owner, signature checked)
//!     → EventChain::anchor_map (state_key → running state hash)
//! ```
//!
//! # Design Decisions
//! - Chains are append-only and hash-linked: each event names its predecessor
//! - The first event links to a genesis hash derived from the chain id
//! - The anchor map of an empty chain is empty, not an error

pub mod anchor_map;
pub mod event_chain;

pub use anchor_map::{AnchorMap, AnchorPair};
pub use event_chain::{AppendError, ChainStateError, EventChain};
