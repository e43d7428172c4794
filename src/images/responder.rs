//! The image responder: id → path → streamed PNG body.
//!
//! # Flow
//! ```text
//! id ─▶ IdPolicy::check ─▶ {dir}/{id}.png ─▶ ImageSource::open
//!    ─▶ prime read (first chunk) ─▶ 200 + image/png ─▶ remaining chunks
//! ```
//!
//! The response head is only built after the first chunk has been read.
//! Anything that fails before that point (missing file, a directory, no
//! permission) still gets a proper error response. A failure after that point
//! can only cut the body short; the head has already been committed.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use futures_util::{future, stream, Stream, StreamExt, TryStreamExt};
use tokio::io::AsyncReadExt;

use crate::config::ImageStoreConfig;
use crate::http::response::ApiError;
use crate::images::id::IdPolicy;
use crate::images::source::{FsImageSource, ImageReader, ImageSource};
use crate::observability::metrics;

/// The only extension ever served.
pub const IMAGE_EXTENSION: &str = "png";

/// The only content type ever served.
pub const IMAGE_CONTENT_TYPE: &str = "image/png";

/// Resolves ids to files under one directory and streams them back.
pub struct ImageResponder {
    dir: PathBuf,
    policy: IdPolicy,
    chunk_size: usize,
    source: Arc<dyn ImageSource>,
}

impl ImageResponder {
    /// Responder reading from the local filesystem.
    pub fn new(config: &ImageStoreConfig) -> Self {
        Self::with_source(config, Arc::new(FsImageSource))
    }

    /// Responder reading through a custom [`ImageSource`].
    pub fn with_source(config: &ImageStoreConfig, source: Arc<dyn ImageSource>) -> Self {
        Self {
            dir: config.dir.clone(),
            policy: config.id_policy,
            chunk_size: config.chunk_size.max(1),
            source,
        }
    }

    /// Build the file path for `id`. Pure: same id, same path.
    ///
    /// The id is appended to the directory as text rather than joined, so a
    /// leading `/` stays inside the directory instead of replacing it.
    pub fn resolve(&self, id: &str) -> Result<PathBuf, ApiError> {
        self.policy
            .check(id)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let mut path = self.dir.clone().into_os_string();
        path.push("/");
        path.push(id);
        path.push(".");
        path.push(IMAGE_EXTENSION);
        Ok(PathBuf::from(path))
    }

    /// Answer a request for `id`.
    pub async fn respond(&self, id: &str) -> Result<Response, ApiError> {
        let path = self.resolve(id)?;
        let mut reader = self.source.open(&path).await?;
        let first = read_chunk(&mut reader, self.chunk_size).await?;

        tracing::debug!(path = %path.display(), "Streaming image");

        let body = match first {
            None => Body::empty(),
            Some(first) => {
                metrics::record_bytes_served(first.len());
                let rest = chunks(reader, self.chunk_size)
                    .inspect_ok(|chunk| metrics::record_bytes_served(chunk.len()))
                    .inspect_err(move |e| {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Image stream aborted after headers were sent"
                        );
                    });
                Body::from_stream(stream::once(future::ready(Ok(first))).chain(rest))
            }
        };

        Ok((
            [(header::CONTENT_TYPE, HeaderValue::from_static(IMAGE_CONTENT_TYPE))],
            body,
        )
            .into_response())
    }
}

/// Read up to `chunk_size` bytes. `None` means end of file.
async fn read_chunk(reader: &mut ImageReader, chunk_size: usize) -> io::Result<Option<Bytes>> {
    let mut buf = vec![0u8; chunk_size];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some(Bytes::from(buf)))
}

/// The rest of the file as a stream of chunks. Owns the reader, so the handle
/// is closed when the stream finishes, fails, or is dropped.
fn chunks(reader: ImageReader, chunk_size: usize) -> impl Stream<Item = io::Result<Bytes>> + Send {
    stream::try_unfold(reader, move |mut reader| async move {
        Ok(read_chunk(&mut reader, chunk_size)
            .await?
            .map(|chunk| (chunk, reader)))
    })
}
