//! Configuration schema definitions.
//!
//! All sections derive Serde traits and carry defaults, so an empty file is
//! a valid configuration.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Base Sepolia, the default anchoring network.
pub const DEFAULT_TARGET_CHAIN_ID: u64 = 84532;

/// Payloads above this size are stored out of band by the relay.
pub const DEFAULT_EMBED_LIMIT_BYTES: usize = 1024 * 1024;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Relay the client talks to.
    pub relay: RelayConfig,

    /// Anchoring behaviour.
    pub anchor: AnchorConfig,

    /// Known networks and their anchor contracts.
    pub networks: Vec<NetworkConfig>,

    /// Reference relay server settings.
    pub relay_server: RelayServerConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            anchor: AnchorConfig::default(),
            networks: vec![NetworkConfig::base_sepolia()],
            relay_server: RelayServerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Network entry for `chain_id`.
    pub fn network(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    pub fn network_mut(&mut self, chain_id: u64) -> Option<&mut NetworkConfig> {
        self.networks.iter_mut().find(|n| n.chain_id == chain_id)
    }

    /// Network anchoring is expected to happen on.
    pub fn target_network(&self) -> Option<&NetworkConfig> {
        self.network(self.anchor.target_chain_id)
    }

    /// Anchor contract deployed on `chain_id`, if one is configured.
    pub fn contract_address(&self, chain_id: u64) -> Option<Address> {
        self.network(chain_id)
            .and_then(|n| n.anchor_contract.as_deref())
            .and_then(|addr| addr.parse().ok())
    }
}

/// Relay client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Base URL of the relay.
    pub url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Default page size when listing messages.
    pub message_limit: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            message_limit: 50,
        }
    }
}

/// Anchoring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Chain the anchor contract lives on.
    pub target_chain_id: u64,

    /// Use the in-memory simulated ledger instead of a contract.
    pub simulate: bool,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// How long to wait for a submitted transaction to be mined.
    pub confirmation_timeout_secs: u64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            target_chain_id: DEFAULT_TARGET_CHAIN_ID,
            simulate: false,
            rpc_timeout_secs: 10,
            confirmation_timeout_secs: 120,
        }
    }
}

/// A network the wallet may be connected to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Chain ID (e.g., 84532 for Base Sepolia, 31337 for local Anvil).
    pub chain_id: u64,

    /// Human-readable name for logs.
    #[serde(default)]
    pub name: String,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Address of the anchor contract on this network.
    #[serde(default)]
    pub anchor_contract: Option<String>,
}

impl NetworkConfig {
    pub fn base_sepolia() -> Self {
        Self {
            chain_id: DEFAULT_TARGET_CHAIN_ID,
            name: "base-sepolia".to_string(),
            rpc_url: "https://sepolia.base.org".to_string(),
            failover_urls: Vec::new(),
            anchor_contract: None,
        }
    }
}

/// Reference relay server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,

    /// Externally reachable base URL, used for out-of-band payload links.
    pub public_url: String,

    /// Payloads larger than this are stored externally.
    pub embed_limit_bytes: usize,

    /// Maximum accepted request body.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Page size when a listing does not ask for one.
    pub page_size: usize,

    /// Largest page a single listing returns.
    pub max_page_size: usize,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            public_url: "http://localhost:8000".to_string(),
            embed_limit_bytes: DEFAULT_EMBED_LIMIT_BYTES,
            max_body_bytes: 16 * 1024 * 1024,
            request_timeout_secs: 30,
            page_size: 50,
            max_page_size: 500,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.anchor.target_chain_id, 84532);
        assert_eq!(config.relay.message_limit, 50);
        assert_eq!(config.relay_server.embed_limit_bytes, DEFAULT_EMBED_LIMIT_BYTES);
        assert_eq!(config.networks, vec![NetworkConfig::base_sepolia()]);
        assert!(!config.anchor.simulate);
    }

    #[test]
    fn test_contract_address_lookup() {
        let config: AppConfig = toml::from_str(
            r#"
            [[networks]]
            chain_id = 31337
            rpc_url = "http://localhost:8545"
            anchor_contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

            [[networks]]
            chain_id = 84532
            rpc_url = "https://sepolia.base.org"
            "#,
        )
        .unwrap();

        assert!(config.contract_address(31337).is_some());
        assert!(config.contract_address(84532).is_none());
        assert!(config.contract_address(1).is_none());
        assert_eq!(config.target_network().map(|n| n.chain_id), Some(84532));
    }
}
