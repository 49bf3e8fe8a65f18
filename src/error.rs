//! Crate-level error aggregating the subsystem errors.

use thiserror::Error;

use crate::anchor::types::AnchorError;
use crate::blockchain::types::{BlockchainError, SigningError};
use crate::chain::event_chain::{AppendError, ChainStateError};
use crate::config::loader::ConfigError;
use crate::record::types::ValidationError;
use crate::relay::types::TransportError;

/// Any failure surfaced by a [`Session`](crate::session::Session) or the CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    ChainState(#[from] ChainStateError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No wallet connected")]
    NotConnected,
}

impl From<AppendError> for Error {
    fn from(err: AppendError) -> Self {
        match err {
            AppendError::Signing(e) => Error::Signing(e),
            AppendError::Chain(e) => Error::ChainState(e),
        }
    }
}

impl Error {
    /// The user declined a signature or transaction.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::Signing(SigningError::Rejected) | Error::Anchor(AnchorError::Rejected)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
