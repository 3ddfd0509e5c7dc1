use std::fs::read_dir;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::Camera;

/// A headless camera: frames arrive as JPEG files dropped into a spool
/// directory, and capturing a frame consumes the oldest one. An empty or
/// missing spool is "nothing to capture".
pub struct SpoolCamera {
    spool_dir: PathBuf,
}

impl SpoolCamera {
    pub fn new<P: Into<PathBuf>>(spool_dir: P) -> Self {
        Self {
            spool_dir: spool_dir.into(),
        }
    }
}

/// List JPEG files in a directory and its subdirectories.
fn list_jpeg_files<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in read_dir(path)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            // Recursively traverse subdirectories
            files.extend(list_jpeg_files(path)?);
        } else if is_jpeg(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

/// Check if the path has a valid JPEG extension.
fn is_jpeg(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"),
        None => false,
    }
}

#[async_trait]
impl Camera for SpoolCamera {
    async fn capture_frame(&self) -> Result<Option<Vec<u8>>> {
        if !self.spool_dir.is_dir() {
            return Ok(None);
        }

        // The recursive scan is synchronous I/O, so keep it off the
        // runtime threads.
        let spool_dir = self.spool_dir.clone();
        let mut files = tokio::task::spawn_blocking(move || list_jpeg_files(&spool_dir)).await??;
        files.sort();

        let Some(path) = files.into_iter().next() else {
            return Ok(None);
        };

        let bytes = tokio::fs::read(&path).await?;
        tokio::fs::remove_file(&path).await?;
        debug!("Captured frame from {} ({} bytes)", path.display(), bytes.len());
        Ok(Some(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_list_jpeg_files() {
        let tmp_dir = tempdir().unwrap();

        // Create files with different extensions
        File::create(tmp_dir.path().join("frame1.JPG")).unwrap();
        File::create(tmp_dir.path().join("frame2.jpeg")).unwrap();
        File::create(tmp_dir.path().join("notes.txt")).unwrap();

        // Create subdirectory and add a JPEG file
        let sub_dir = tmp_dir.path().join("subdir");
        create_dir(&sub_dir).unwrap();
        File::create(sub_dir.join("frame3.jpg")).unwrap();

        let jpeg_files = list_jpeg_files(tmp_dir.path()).unwrap();

        assert_eq!(jpeg_files.len(), 3);
        assert!(jpeg_files.contains(&tmp_dir.path().join("frame1.JPG")));
        assert!(jpeg_files.contains(&tmp_dir.path().join("frame2.jpeg")));
        assert!(jpeg_files.contains(&sub_dir.join("frame3.jpg")));
    }

    #[test]
    fn test_is_jpeg() {
        assert!(is_jpeg(Path::new("frame.jpg")));
        assert!(is_jpeg(Path::new("frame.jpeg")));
        assert!(!is_jpeg(Path::new("frame.png")));
        assert!(!is_jpeg(Path::new("frame")));
    }

    #[tokio::test]
    async fn test_capture_consumes_oldest_spooled_frame() {
        let tmp_dir = tempdir().unwrap();
        let camera = SpoolCamera::new(tmp_dir.path());

        let mut first = File::create(tmp_dir.path().join("a.jpg")).unwrap();
        first.write_all(b"first frame").unwrap();
        let mut second = File::create(tmp_dir.path().join("b.jpg")).unwrap();
        second.write_all(b"second frame").unwrap();

        assert_eq!(
            camera.capture_frame().await.unwrap(),
            Some(b"first frame".to_vec())
        );
        assert_eq!(
            camera.capture_frame().await.unwrap(),
            Some(b"second frame".to_vec())
        );
        assert_eq!(camera.capture_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_spool_directory_is_a_no_op() {
        let camera = SpoolCamera::new("/definitely/not/a/real/spool");
        assert_eq!(camera.capture_frame().await.unwrap(), None);
    }
}
