//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → logging.rs (structured tracing events, per-request spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Prometheus scrape endpoint
//! ```
//!
//! The request ID is attached to every request span, so log lines from the
//! handler and the CORS gate can be correlated.

pub mod logging;
pub mod metrics;
