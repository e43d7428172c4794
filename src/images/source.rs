//! Where image bytes come from.
//!
//! The responder only needs "open this path for reading". Keeping that behind
//! a trait lets tests observe (or forbid) file opens without touching the
//! real filesystem layer.

use std::io;
use std::path::Path;
use std::pin::Pin;

use futures_util::future::BoxFuture;
use tokio::io::AsyncRead;

/// An open, read-only byte source. Dropping it releases the handle.
pub type ImageReader = Pin<Box<dyn AsyncRead + Send>>;

/// Opens image files for reading.
pub trait ImageSource: Send + Sync {
    fn open(&self, path: &Path) -> BoxFuture<'static, io::Result<ImageReader>>;
}

/// Reads images straight from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsImageSource;

impl ImageSource for FsImageSource {
    fn open(&self, path: &Path) -> BoxFuture<'static, io::Result<ImageReader>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let file = tokio::fs::File::open(&path).await?;
            Ok(Box::pin(file) as ImageReader)
        })
    }
}
