//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to the HTTP server at startup
//! ```
//!
//! All fields have defaults so an empty file (or no file) is a working config.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CorsConfig, ImageStoreConfig, ListenerConfig, ObservabilityConfig, ServiceConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
