//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the anchor target refers to a configured network
//! - Validate value ranges (timeouts > 0, limits > 0, URLs parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL {value:?}")]
    InvalidUrl { field: String, value: String },

    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: String, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: String },

    #[error("networks[{chain_id}].anchor_contract: invalid address {value:?}")]
    InvalidContract { chain_id: u64, value: String },

    #[error("networks: chain {0} configured more than once")]
    DuplicateNetwork(u64),

    #[error("anchor.target_chain_id: no network configured for chain {0}")]
    UnknownTarget(u64),

    #[error("relay_server.page_size: {page_size} exceeds max_page_size {max_page_size}")]
    PageSize { page_size: usize, max_page_size: usize },
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "relay.url", &config.relay.url);
    check_nonzero(&mut errors, "relay.timeout_secs", config.relay.timeout_secs);
    check_nonzero(
        &mut errors,
        "relay.message_limit",
        config.relay.message_limit as u64,
    );

    check_nonzero(
        &mut errors,
        "anchor.rpc_timeout_secs",
        config.anchor.rpc_timeout_secs,
    );
    check_nonzero(
        &mut errors,
        "anchor.confirmation_timeout_secs",
        config.anchor.confirmation_timeout_secs,
    );

    let mut seen = HashSet::new();
    for network in &config.networks {
        if !seen.insert(network.chain_id) {
            errors.push(ValidationError::DuplicateNetwork(network.chain_id));
        }
        check_url(
            &mut errors,
            &format!("networks[{}].rpc_url", network.chain_id),
            &network.rpc_url,
        );
        for (i, url) in network.failover_urls.iter().enumerate() {
            check_url(
                &mut errors,
                &format!("networks[{}].failover_urls[{}]", network.chain_id, i),
                url,
            );
        }
        if let Some(contract) = &network.anchor_contract {
            if contract.parse::<Address>().is_err() {
                errors.push(ValidationError::InvalidContract {
                    chain_id: network.chain_id,
                    value: contract.clone(),
                });
            }
        }
    }

    // Simulation does not need an RPC endpoint for the target chain
    if !config.anchor.simulate && config.target_network().is_none() {
        errors.push(ValidationError::UnknownTarget(config.anchor.target_chain_id));
    }

    let server = &config.relay_server;
    if server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "relay_server.bind_address".to_string(),
            value: server.bind_address.clone(),
        });
    }
    check_url(&mut errors, "relay_server.public_url", &server.public_url);
    check_nonzero(
        &mut errors,
        "relay_server.embed_limit_bytes",
        server.embed_limit_bytes as u64,
    );
    check_nonzero(
        &mut errors,
        "relay_server.max_body_bytes",
        server.max_body_bytes as u64,
    );
    check_nonzero(
        &mut errors,
        "relay_server.request_timeout_secs",
        server.request_timeout_secs,
    );
    check_nonzero(&mut errors, "relay_server.page_size", server.page_size as u64);
    check_nonzero(
        &mut errors,
        "relay_server.max_page_size",
        server.max_page_size as u64,
    );
    if server.page_size > server.max_page_size {
        errors.push(ValidationError::PageSize {
            page_size: server.page_size,
            max_page_size: server.max_page_size,
        });
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address".to_string(),
            value: obs.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if url::Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_nonzero(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero {
            field: field.to_string(),
        });
    }
}
