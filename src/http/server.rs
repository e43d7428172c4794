//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the image route, health probe and fallback
//! - Wire up middleware (request ID, tracing, timeout, CORS gate)
//! - Serve on a listener until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::FromRef,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::ApiError;
use crate::images::{serve_image, ImageResponder, ImageSource};
use crate::lifecycle::shutdown::signalled;
use crate::security::{cors_gate, CorsPolicy};

/// Route serving one image by id.
pub const IMAGE_ROUTE: &str = "/api/images/{id}";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub images: Arc<ImageResponder>,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    /// State backed by the local filesystem.
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            images: Arc::new(ImageResponder::new(&config.images)),
            cors: Arc::new(CorsPolicy::from_config(&config.cors)),
        }
    }

    /// State reading images through a custom source.
    pub fn with_source(config: &ServiceConfig, source: Arc<dyn ImageSource>) -> Self {
        Self {
            images: Arc::new(ImageResponder::with_source(&config.images, source)),
            cors: Arc::new(CorsPolicy::from_config(&config.cors)),
        }
    }
}

impl FromRef<AppState> for Arc<ImageResponder> {
    fn from_ref(state: &AppState) -> Self {
        state.images.clone()
    }
}

impl FromRef<AppState> for Arc<CorsPolicy> {
    fn from_ref(state: &AppState) -> Self {
        state.cors.clone()
    }
}

/// HTTP server for the image service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Server reading images from the configured directory.
    pub fn new(config: ServiceConfig) -> Self {
        let state = AppState::new(&config);
        Self::with_state(config, state)
    }

    /// Server around an already built state.
    pub fn with_state(config: ServiceConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// A copy of the fully layered router, e.g. for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then let in-flight
    /// responses finish.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            image_dir = %self.config.images.dir.display(),
            id_policy = ?self.config.images.id_policy,
            cors = self.config.cors.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// Outermost first: request ID assignment, tracing span, request ID
/// propagation, timeout. The CORS gate wraps the image route only.
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let image_route =
        any(serve_image).layer(from_fn_with_state(state.cors.clone(), cors_gate));

    Router::new()
        .route(IMAGE_ROUTE, image_route)
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.timeouts.request_secs),
        ))
        .layer(propagate_request_id_layer())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request.request_id(),
                )
            }),
        )
        .layer(set_request_id_layer())
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
