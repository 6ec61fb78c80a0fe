//! Upload MIME allow-list and the classification derived from it.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Every MIME type accepted by media ingestion.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/avi",
    "video/webm",
    "video/mov",
    "video/mkv",
    "application/pdf",
];

/// Default upload size ceiling: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Maximum number of files in one batch upload.
pub const MAX_BATCH_FILES: usize = 10;

/// Which weekly counter a prediction is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Classify a MIME type. Only images and videos are predictable.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(MediaKind::Photo)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }
}

/// Reject MIME types outside [`ALLOWED_MIME_TYPES`].
pub fn ensure_allowed_mime(mime: &str) -> Result<(), CoreError> {
    if ALLOWED_MIME_TYPES.contains(&mime) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported file format: {mime}"
        )))
    }
}

/// Reject payloads larger than `max_bytes`.
pub fn ensure_within_size(len: usize, max_bytes: usize) -> Result<(), CoreError> {
    if len > max_bytes {
        let mib = max_bytes / (1024 * 1024);
        return Err(CoreError::Validation(format!(
            "File exceeds the maximum upload size of {mib}MB"
        )));
    }
    Ok(())
}

/// Every physical type bucket directory under the upload root.
pub const MEDIA_BUCKETS: &[&str] = &["images", "videos", "audios", "documents", "others"];

/// Physical type bucket directory name for a MIME type.
pub fn bucket_for_mime(mime: &str) -> &'static str {
    if mime.starts_with("image/") {
        "images"
    } else if mime.starts_with("video/") {
        "videos"
    } else if mime.starts_with("audio/") {
        "audios"
    } else if mime == "application/pdf" {
        "documents"
    } else {
        "others"
    }
}
