//! Mapping between stored media paths and the filesystem.
//!
//! Stored paths are relative, `/`-separated and start with one of three
//! public prefixes: `uploads/` for originals, and `processed-images/` or
//! `processed-videos/` for annotated outputs. The same prefix is the URL
//! path under which the file is served.

use std::io;
use std::path::{Path, PathBuf};

use breedid_core::storage::{destination_dir, generate_filename, StorageScope};
use breedid_core::types::Timestamp;

use crate::config::ServerConfig;

pub const UPLOADS_PREFIX: &str = "uploads";
pub const PROCESSED_IMAGES_PREFIX: &str = "processed-images";
pub const PROCESSED_VIDEOS_PREFIX: &str = "processed-videos";

/// Stored path for a new upload: `uploads/{layout}/{filename}`.
pub fn new_upload_path(
    scope: StorageScope,
    mime: &str,
    original_name: &str,
    now: Timestamp,
) -> String {
    let filename = generate_filename(now, original_name, &mut rand::rng());
    let rel = destination_dir(Path::new(""), scope, mime, now).join(filename);
    let rel: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("{UPLOADS_PREFIX}/{}", rel.join("/"))
}

/// Stored path for an annotated output: `processed-{images|videos}/{uuid}.{ext}`.
pub fn new_processed_path(is_video: bool, extension: &str) -> String {
    let prefix = if is_video {
        PROCESSED_VIDEOS_PREFIX
    } else {
        PROCESSED_IMAGES_PREFIX
    };
    format!("{prefix}/{}.{extension}", uuid::Uuid::new_v4())
}

/// Resolve a stored path to its location on disk.
///
/// Returns `None` for unknown prefixes and for any path containing `..` or
/// empty segments.
pub fn fs_path_for(config: &ServerConfig, stored: &str) -> Option<PathBuf> {
    let normalized = stored.replace('\\', "/");
    let mut segments = normalized.split('/');
    let prefix = segments.next()?;
    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() || rest.iter().any(|s| s.is_empty() || *s == "..") {
        return None;
    }

    let base = match prefix {
        UPLOADS_PREFIX => config.upload_root.clone(),
        PROCESSED_IMAGES_PREFIX | PROCESSED_VIDEOS_PREFIX => config.public_root.join(prefix),
        _ => return None,
    };
    Some(rest.iter().fold(base, |acc, s| acc.join(s)))
}

/// Write `bytes` to `path`, creating parent directories.
pub async fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

/// Remove a file. A missing file counts as removed.
pub async fn remove_file(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
