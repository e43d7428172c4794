//! Image serving subsystem.
//!
//! `GET /api/images/{id}` answers with the bytes of `{dir}/{id}.png`.

pub mod id;
pub mod responder;
pub mod source;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;
use crate::observability::metrics;

pub use id::{IdError, IdPolicy};
pub use responder::{ImageResponder, IMAGE_CONTENT_TYPE, IMAGE_EXTENSION};
pub use source::{FsImageSource, ImageReader, ImageSource};

/// Route handler for a single image.
///
/// A path parameter that cannot be extracted is a bad request with the
/// extractor's own message, same as any other failure to build the path.
pub async fn serve_image(
    State(responder): State<Arc<ImageResponder>>,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    let start = Instant::now();

    let result = match id {
        Ok(Path(id)) => {
            tracing::debug!(id = %id, "Image requested");
            responder.respond(&id).await
        }
        Err(rejection) => Err(ApiError::InvalidRequest(rejection.body_text())),
    };

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    if let Err(e) = &result {
        tracing::info!(outcome, error = %e, "Image request failed");
    }

    let response = result.unwrap_or_else(|e| e.into_response());
    metrics::record_request(outcome, response.status().as_u16(), start);
    response
}
