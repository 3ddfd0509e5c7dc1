use super::models::{CompressionOptions, Photo, PhotoError, PhotoRecord};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// The shared photo table. Ids and creation timestamps are assigned by the
/// store, never by the caller.
#[async_trait]
pub trait PhotoStore: 'static + Send + Sync {
    async fn insert(&self, image_data: &[u8], title: Option<&str>) -> Result<PhotoRecord>;

    /// Every persisted row.
    async fn fetch_all(&self) -> Result<Vec<PhotoRecord>>;

    /// Hard delete. `Ok(false)` means no row had that id.
    async fn delete(&self, id: &Uuid) -> Result<bool>;

    /// Update only the title column. `None` clears it.
    async fn update_title(&self, id: &Uuid, title: Option<&str>) -> Result<bool>;
}

/// Lossy size reduction of an encoded image. Best effort: callers keep the
/// original bytes when this fails.
pub trait ImageCompressor: 'static + Send + Sync {
    fn compress(&self, bytes: &[u8], options: &CompressionOptions) -> Result<Vec<u8>, PhotoError>;
}

/// Source of captured frames. `Ok(None)` means nothing to capture right
/// now, which callers treat as a dismissible no-op.
#[async_trait]
pub trait Camera: 'static + Send + Sync {
    async fn capture_frame(&self) -> Result<Option<Vec<u8>>>;
}

/// Platform share/download capability the feed delegates to.
#[async_trait]
pub trait Exporter: 'static + Send + Sync {
    async fn share(&self, photo: &Photo) -> Result<()>;
    async fn download(&self, photo: &Photo) -> Result<()>;
}
