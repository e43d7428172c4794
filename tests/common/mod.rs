//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use axum::response::Response;
use futures_util::future::BoxFuture;
use image_api::config::ServiceConfig;
use image_api::images::{FsImageSource, ImageReader, ImageSource};
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

/// First bytes of every PNG file.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// A small fake PNG: the signature followed by some filler.
pub fn fake_png(len: usize) -> Vec<u8> {
    let mut data = PNG_SIGNATURE.to_vec();
    data.extend((0..len.saturating_sub(PNG_SIGNATURE.len())).map(|i| (i % 251) as u8));
    data
}

/// A temporary image directory holding `{id}.png` for each entry.
pub fn image_dir(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (id, bytes) in files {
        std::fs::write(dir.path().join(format!("{id}.png")), bytes).unwrap();
    }
    dir
}

/// Default config pointed at `dir`, with metrics off.
pub fn config_for(dir: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.images.dir = dir.to_path_buf();
    config.observability.metrics_enabled = false;
    config
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Filesystem source that records every path it is asked to open.
#[derive(Default)]
pub struct RecordingSource {
    opens: AtomicUsize,
    paths: Mutex<Vec<PathBuf>>,
}

impl RecordingSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

impl ImageSource for RecordingSource {
    fn open(&self, path: &Path) -> BoxFuture<'static, io::Result<ImageReader>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(path.to_path_buf());
        FsImageSource.open(path)
    }
}

/// Source whose every open fails with the given kind.
pub struct FailingSource(pub io::ErrorKind);

impl ImageSource for FailingSource {
    fn open(&self, _path: &Path) -> BoxFuture<'static, io::Result<ImageReader>> {
        let kind = self.0;
        Box::pin(async move { Err(io::Error::from(kind)) })
    }
}

/// Source whose files yield `first` and then fail on the next read.
pub struct BrokenMidwaySource {
    pub first: Vec<u8>,
}

impl ImageSource for BrokenMidwaySource {
    fn open(&self, _path: &Path) -> BoxFuture<'static, io::Result<ImageReader>> {
        let reader = BrokenMidwayReader {
            first: Some(self.first.clone()),
        };
        Box::pin(async move { Ok(Box::pin(reader) as ImageReader) })
    }
}

struct BrokenMidwayReader {
    first: Option<Vec<u8>>,
}

impl AsyncRead for BrokenMidwayReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut().first.take() {
            Some(chunk) => {
                buf.put_slice(&chunk);
                Poll::Ready(Ok(()))
            }
            None => Poll::Ready(Err(io::Error::other("disk went away"))),
        }
    }
}
