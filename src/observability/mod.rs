//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Builder, broadcaster and poller produce:
//!     → logging.rs (structured log events, one span per transfer)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Signing keys never reach a log field; only addresses and hashes do
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
