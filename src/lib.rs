//! Image API: serves `{id}.png` files from one directory over HTTP.
//!
//! `GET /api/images/{id}` streams the file back as `image/png`, behind an
//! optional CORS gate that only lets `GET` through.

pub mod config;
pub mod http;
pub mod images;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
