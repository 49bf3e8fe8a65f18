//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{AppConfig, NetworkConfig};
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_RELAY_URL: &str = "EVENT_ANCHOR_RELAY_URL";
pub const ENV_MESSAGE_LIMIT: &str = "EVENT_ANCHOR_MESSAGE_LIMIT";
pub const ENV_TARGET_CHAIN_ID: &str = "EVENT_ANCHOR_TARGET_CHAIN_ID";
pub const ENV_SIMULATE: &str = "EVENT_ANCHOR_SIMULATE";
/// Suffixed with the chain id, e.g. `EVENT_ANCHOR_RPC_URL_84532`.
pub const ENV_RPC_URL_PREFIX: &str = "EVENT_ANCHOR_RPC_URL_";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: String, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value {:?} for {}", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, override from the process environment, and validate.
///
/// Without a path the defaults are used as the base.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        relay_url = %config.relay.url,
        target_chain_id = config.anchor.target_chain_id,
        simulate = config.anchor.simulate,
        networks = config.networks.len(),
        "Configuration loaded"
    );
    Ok(config)
}

fn parse_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply `EVENT_ANCHOR_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_RELAY_URL) {
        config.relay.url = url;
    }
    if let Some(value) = lookup(ENV_MESSAGE_LIMIT) {
        config.relay.message_limit = parse_var(ENV_MESSAGE_LIMIT, value)?;
    }
    if let Some(value) = lookup(ENV_TARGET_CHAIN_ID) {
        config.anchor.target_chain_id = parse_var(ENV_TARGET_CHAIN_ID, value)?;
    }
    if let Some(value) = lookup(ENV_SIMULATE) {
        config.anchor.simulate = match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => {
                return Err(ConfigError::Env {
                    var: ENV_SIMULATE.to_string(),
                    value,
                })
            }
        };
    }

    // The target network can be introduced entirely from the environment
    let target = config.anchor.target_chain_id;
    let mut chain_ids: Vec<u64> = config.networks.iter().map(|n| n.chain_id).collect();
    if !chain_ids.contains(&target) {
        chain_ids.push(target);
    }
    for chain_id in chain_ids {
        let var = format!("{}{}", ENV_RPC_URL_PREFIX, chain_id);
        let Some(url) = lookup(&var) else { continue };
        match config.network_mut(chain_id) {
            Some(network) => network.rpc_url = url,
            None => config.networks.push(NetworkConfig {
                chain_id,
                name: format!("chain-{}", chain_id),
                rpc_url: url,
                failover_urls: Vec::new(),
                anchor_contract: None,
            }),
        }
    }

    Ok(())
}

fn parse_var<T: std::str::FromStr>(var: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var: var.to_string(),
        value,
    })
}
