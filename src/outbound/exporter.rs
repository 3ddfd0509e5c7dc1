use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::domain::{codec::data_url_to_buffer, models::Photo, ports::Exporter};

/// Share/download capability for headless targets: both operations land
/// the decoded photo as a JPEG file in an export directory. A platform
/// port would hand the file to a share sheet instead.
pub struct DiskExporter {
    export_dir: PathBuf,
}

impl DiskExporter {
    pub fn new<P: Into<PathBuf>>(export_dir: P) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    async fn write(&self, photo: &Photo) -> Result<PathBuf> {
        let decoded = data_url_to_buffer(&photo.image_url)?;
        tokio::fs::create_dir_all(&self.export_dir).await?;

        let path = self.export_dir.join(format!("{}.jpg", photo.id));
        tokio::fs::write(&path, &decoded.bytes).await?;
        Ok(path)
    }
}

#[async_trait]
impl Exporter for DiskExporter {
    async fn share(&self, photo: &Photo) -> Result<()> {
        let path = self.write(photo).await?;
        info!(
            "Sharing photo {} (\"{}\") via {}",
            photo.id,
            photo.title.as_deref().unwrap_or("untitled"),
            path.display()
        );
        Ok(())
    }

    async fn download(&self, photo: &Photo) -> Result<()> {
        let path = self.write(photo).await?;
        info!("Downloaded photo {} to {}", photo.id, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codec::buffer_to_data_url;
    use chrono::Utc;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn photo_with_bytes(bytes: &[u8]) -> Photo {
        Photo {
            id: Uuid::new_v4(),
            image_url: buffer_to_data_url(bytes, "image/jpeg"),
            title: Some("export me".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_download_writes_decoded_bytes() {
        let tmp_dir = tempdir().unwrap();
        let exporter = DiskExporter::new(tmp_dir.path());
        let photo = photo_with_bytes(b"jpeg payload");

        exporter.download(&photo).await.unwrap();

        let written = std::fs::read(tmp_dir.path().join(format!("{}.jpg", photo.id))).unwrap();
        assert_eq!(written, b"jpeg payload");
    }

    #[tokio::test]
    async fn test_share_creates_the_export_directory() {
        let tmp_dir = tempdir().unwrap();
        let nested = tmp_dir.path().join("party").join("exports");
        let exporter = DiskExporter::new(&nested);
        let photo = photo_with_bytes(b"payload");

        exporter.share(&photo).await.unwrap();

        assert!(nested.join(format!("{}.jpg", photo.id)).exists());
    }
}
