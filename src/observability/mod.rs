//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! record / anchor / relay produce:
//!     → tracing events with structured fields (logging.rs installs the sink)
//!     → counters (metrics.rs)
//!
//! Consumers:
//!     → stderr (human or JSON lines)
//!     → Prometheus scrape endpoint (relay server, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
