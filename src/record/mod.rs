//! Record construction and signing.
//!
//! # Data Flow
//! ```text
//! payload + media type + meta
//!     → media.rs (payload validated against the declared media type)
//!     → event.rs / message.rs (immutable record)
//!     → canonical.rs (deterministic bytes, bound to the signer address)
//!     → signed.rs (EIP-191 signature attached, payload untouched)
//! ```
//!
//! # Design Decisions
//! - Payloads are fixed at construction; signing only attaches a signature
//! - Only the payload digest and size are signed, so large payloads can be
//!   stored out of band without invalidating the record
//! - Verification never errors: malformed input verifies as `false`

mod canonical;
pub mod event;
pub mod media;
pub mod message;
pub mod signed;
pub mod types;

pub use event::{Event, SignedEvent};
pub use media::MediaType;
pub use message::{Message, SignedMessage};
pub use signed::{sign_with, Canonical, Signed};
pub use types::{Content, Meta, ValidationError};
