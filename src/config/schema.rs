//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the image
//! service. All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::images::IdPolicy;

/// Root configuration for the image service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where images are read from and how ids are checked.
    pub images: ImageStoreConfig,

    /// CORS gate in front of the image route.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Image directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageStoreConfig {
    /// Directory holding `{id}.png` files. Read-only from the service's view.
    pub dir: PathBuf,

    /// Identifier check applied before the path is built.
    pub id_policy: IdPolicy,

    /// Size of each body chunk in bytes.
    pub chunk_size: usize,
}

impl Default for ImageStoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public/images"),
            id_policy: IdPolicy::default(),
            chunk_size: 64 * 1024,
        }
    }
}

/// CORS gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable the gate. When disabled every method reaches the image route.
    pub enabled: bool,

    /// Methods allowed to reach the image route.
    pub allowed_methods: Vec<String>,

    /// Allowed origins. `"*"` allows any origin and must stand alone.
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime sent as `Access-Control-Max-Age`.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_methods: vec!["GET".to_string()],
            allowed_origins: vec!["*".to_string()],
            max_age_secs: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce the response head, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (trace, debug, info, warn, error, or an `EnvFilter` directive).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
