//! Metrics collection and exposition.
//!
//! # Metrics
//! - `records_signed_total{kind}` (counter): events and messages signed
//! - `anchor_submissions_total{status}` (counter): anchor attempts by outcome
//! - `anchor_pairs_total` (counter): pairs committed in confirmed transactions
//! - `relay_messages_stored_total` (counter): messages accepted by the relay
//! - `relay_external_payloads_total` (counter): payloads moved out of band
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::anchor::types::AnchorStatus;

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_signed(kind: &'static str) {
    ::metrics::counter!("records_signed_total", "kind" => kind).increment(1);
}

pub fn record_anchor(status: AnchorStatus, pairs: usize) {
    let label = match status {
        AnchorStatus::Confirmed => "confirmed",
        AnchorStatus::Reverted => "reverted",
        AnchorStatus::Failed => "failed",
        AnchorStatus::Cancelled => "cancelled",
    };
    ::metrics::counter!("anchor_submissions_total", "status" => label).increment(1);
    if status == AnchorStatus::Confirmed {
        ::metrics::counter!("anchor_pairs_total").increment(pairs as u64);
    }
}

pub fn record_relay_stored(external: bool) {
    ::metrics::counter!("relay_messages_stored_total").increment(1);
    if external {
        ::metrics::counter!("relay_external_payloads_total").increment(1);
    }
}
