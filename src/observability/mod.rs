//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! rpc, pipeline and http layers produce:
//!     → logging.rs (structured log events, request id in the trace span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
