use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// A photo as the feed displays it: the payload travels as a base64
/// data-URL, ready to be handed straight to an image view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: Uuid,
    pub image_url: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A photo row as the store persists it. Image bytes stay binary at rest;
/// the base64 conversion happens at the repository boundary.
#[derive(Debug, Clone)]
pub struct PhotoRecord {
    pub id: Uuid,
    pub image_data: Vec<u8>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rough device class, used to pick compression defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProfile {
    Mobile,
    Desktop,
}

/// Bounds and quality for the lossy re-encode step.
#[derive(Debug, Clone, Copy)]
pub struct CompressionOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality on a 0.0..=1.0 fidelity scale.
    pub quality: f32,
}

impl CompressionOptions {
    pub fn for_profile(profile: DeviceProfile) -> Self {
        match profile {
            DeviceProfile::Mobile => Self {
                max_width: 2048,
                max_height: 2048,
                quality: 0.85,
            },
            DeviceProfile::Desktop => Self {
                max_width: 2560,
                max_height: 2560,
                quality: 0.90,
            },
        }
    }
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self::for_profile(DeviceProfile::Desktop)
    }
}

#[derive(Debug, Error)]
pub enum PhotoError {
    /// The image bytes could not be decoded into a bitmap.
    #[error("image decode failed: {0}")]
    DecodeFailure(String),
    /// The data-URL string could not be parsed.
    #[error("malformed data-URL: {0}")]
    MalformedInput(String),
    /// The storage collaborator rejected an insert, update or delete.
    #[error("persistence failed: {0}")]
    Persistence(String),
}
