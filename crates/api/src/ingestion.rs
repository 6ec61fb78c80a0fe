//! Multipart intake: allow-list, size ceiling and on-disk persistence.
//!
//! Every file is checked against the MIME allow-list and the size ceiling
//! while it is being read, so nothing is written for a rejected upload.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use breedid_core::media::{ensure_allowed_mime, ensure_within_size};
use breedid_core::storage::StorageScope;
use breedid_core::types::Timestamp;

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::storage;

/// A file read fully into memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Files plus the plain text fields that came with them, in arrival order.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    /// First non-blank value of a text field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.values(name).into_iter().find(|v| !v.trim().is_empty())
    }

    /// Every value of a repeated text field (`names`, `names[]`).
    pub fn values(&self, name: &str) -> Vec<&str> {
        let bracketed = format!("{name}[]");
        self.fields
            .iter()
            .filter(|(k, _)| *k == name || *k == bracketed)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Take the single expected file.
    pub fn take_single_file(&mut self) -> AppResult<UploadedFile> {
        if self.files.len() > 1 {
            return Err(AppError::BadRequest("Only one file may be uploaded".into()));
        }
        self.files
            .pop()
            .ok_or_else(|| AppError::BadRequest("No file uploaded".into()))
    }

    /// Take all files, requiring at least one.
    pub fn take_files(&mut self) -> AppResult<Vec<UploadedFile>> {
        if self.files.is_empty() {
            return Err(AppError::BadRequest("No files were uploaded".into()));
        }
        Ok(std::mem::take(&mut self.files))
    }
}

/// A file written to disk, with the stored path recorded on the media row.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_name: String,
    pub mime: String,
    pub media_path: String,
    pub size: usize,
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

/// Read a multipart body. File parts are those carrying a filename.
pub async fn read_upload(
    multipart: &mut Multipart,
    max_bytes: usize,
    max_files: usize,
) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_none() {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.push((name, value));
            continue;
        }

        if form.files.len() == max_files {
            return Err(AppError::BadRequest(format!(
                "Too many files. At most {max_files} files can be uploaded at once"
            )));
        }
        form.files.push(read_file(field, max_bytes).await?);
    }

    Ok(form)
}

async fn read_file(mut field: Field<'_>, max_bytes: usize) -> AppResult<UploadedFile> {
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let mime = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_ascii_lowercase();
    ensure_allowed_mime(&mime)?;

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        bytes.extend_from_slice(&chunk);
        ensure_within_size(bytes.len(), max_bytes)?;
    }

    Ok(UploadedFile {
        original_name,
        mime,
        bytes,
    })
}

/// Write an accepted file to its deterministic destination.
pub async fn persist(
    config: &ServerConfig,
    scope: StorageScope,
    file: &UploadedFile,
    now: Timestamp,
) -> AppResult<StoredFile> {
    let media_path = storage::new_upload_path(scope, &file.mime, &file.original_name, now);
    let fs_path = storage::fs_path_for(config, &media_path)
        .ok_or_else(|| AppError::InternalError(format!("Unmappable upload path {media_path}")))?;

    storage::write_file(&fs_path, &file.bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write {}: {e}", fs_path.display())))?;

    tracing::debug!(media_path = %media_path, size = file.bytes.len(), "Stored upload");

    Ok(StoredFile {
        original_name: file.original_name.clone(),
        mime: file.mime.clone(),
        media_path,
        size: file.bytes.len(),
    })
}

/// Best-effort removal of a stored file during compensation.
pub async fn discard(config: &ServerConfig, media_path: &str) {
    let Some(path) = storage::fs_path_for(config, media_path) else {
        return;
    };
    if let Err(e) = storage::remove_file(&path).await {
        tracing::warn!(error = %e, path = %path.display(), "Failed to remove stored file");
    }
}
