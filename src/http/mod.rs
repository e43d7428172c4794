//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign/propagate x-request-id)
//!     → security::cors (image route only)
//!     → images::serve_image
//!     → response.rs (error kinds → status + JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{ApiError, ErrorPayload};
pub use server::{build_router, AppState, HttpServer, IMAGE_ROUTE};
