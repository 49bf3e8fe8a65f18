//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (EVENT_ANCHOR_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to the session, anchor backend and relay server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The signing key never lives in the file; it comes from
//!   `EVENT_ANCHOR_PRIVATE_KEY`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AnchorConfig, AppConfig, NetworkConfig, ObservabilityConfig, RelayConfig,
    RelayServerConfig, DEFAULT_EMBED_LIMIT_BYTES,
};
