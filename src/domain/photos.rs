use std::sync::Arc;

use tracing::{error, warn};
use uuid::Uuid;

use super::{
    codec::{buffer_to_data_url, data_url_to_buffer, FALLBACK_MIME},
    models::{CompressionOptions, Photo, PhotoError},
    ports::{ImageCompressor, PhotoStore},
};

/// The persistence boundary for photos: compresses on the way in, converts
/// binary rows back to displayable data-URLs on the way out. The only
/// component that talks to the store.
pub struct PhotoService {
    store: Arc<dyn PhotoStore>,
    compressor: Arc<dyn ImageCompressor>,
    options: CompressionOptions,
}

/// An empty or blank title means "unset".
pub(crate) fn normalize_title(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl PhotoService {
    pub fn new(
        store: Arc<dyn PhotoStore>,
        compressor: Arc<dyn ImageCompressor>,
        options: CompressionOptions,
    ) -> Self {
        PhotoService {
            store,
            compressor,
            options,
        }
    }

    /// Compress and persist a captured image, handed over as a data-URL.
    ///
    /// The returned [`Photo`] carries the compressed payload and the
    /// store-assigned id and timestamp. Compression failures are absorbed
    /// by keeping the original bytes; a failed insert is a
    /// [`PhotoError::Persistence`] and nothing is stored.
    pub async fn save(
        &self,
        image_data_url: &str,
        title: Option<&str>,
    ) -> Result<Photo, PhotoError> {
        let decoded = data_url_to_buffer(image_data_url)?;

        let bytes = match self.compressor.compress(&decoded.bytes, &self.options) {
            Ok(compressed) => compressed,
            Err(e) => {
                // Best-effort optimization: store the original rather than
                // failing the save.
                warn!("Compression failed, keeping original bytes: {}", e);
                decoded.bytes
            }
        };

        let title = normalize_title(title);
        let record = self
            .store
            .insert(&bytes, title.as_deref())
            .await
            .map_err(|e| PhotoError::Persistence(e.to_string()))?;

        Ok(Photo {
            id: record.id,
            image_url: buffer_to_data_url(&bytes, FALLBACK_MIME),
            title: record.title,
            created_at: record.created_at,
        })
    }

    /// Every photo, newest first. Ties keep the store's own ordering.
    ///
    /// Fail-open: a store error is logged and an empty list returned, so a
    /// feed renders "no photos" instead of crashing when the backend is
    /// unreachable.
    pub async fn list(&self) -> Vec<Photo> {
        let records = match self.store.fetch_all().await {
            Ok(records) => records,
            Err(e) => {
                error!("Error fetching photos: {}", e);
                return Vec::new();
            }
        };

        let mut photos: Vec<Photo> = records
            .into_iter()
            .map(|record| Photo {
                id: record.id,
                image_url: buffer_to_data_url(&record.image_data, FALLBACK_MIME),
                title: record.title,
                created_at: record.created_at,
            })
            .collect();

        // Stable sort, so equal timestamps keep the store order.
        photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        photos
    }

    /// Hard delete. `false` covers both an unknown id and a backend
    /// failure, leaving the caller free to keep the item visible.
    pub async fn delete(&self, id: &Uuid) -> bool {
        match self.store.delete(id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!("Error deleting photo {}: {}", id, e);
                false
            }
        }
    }

    /// Update only the title. An empty string clears it.
    pub async fn rename_title(&self, id: &Uuid, title: &str) -> bool {
        let title = normalize_title(Some(title));
        match self.store.update_title(id, title.as_deref()).await {
            Ok(updated) => updated,
            Err(e) => {
                error!("Error updating title of photo {}: {}", id, e);
                false
            }
        }
    }
}
