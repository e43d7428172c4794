//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request on the image route:
//!     → cors.rs (method allow-list, preflight, origin headers)
//!     → image handler
//! ```
//!
//! Requests refused here never reach the handler, so no file is opened.

pub mod cors;

pub use cors::{cors_gate, AllowedOrigins, CorsOutcome, CorsPolicy};
