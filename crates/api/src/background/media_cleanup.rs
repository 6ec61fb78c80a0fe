//! Deferred physical purge of soft-deleted media.
//!
//! Soft-deleted media keep their row and file until they have stayed
//! deleted for longer than `MEDIA_RETENTION_DAYS`. Each sweep lists the
//! expired rows and purges them one by one; a purge removes the file first,
//! then the row, and is safe to repeat.

use std::sync::Arc;
use std::time::Duration;

use breedid_core::reclamation::purge_cutoff;
use breedid_core::types::Timestamp;
use breedid_db::models::media::ExpiredMedia;
use breedid_db::repositories::MediaRepo;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::storage;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Physically remove one soft-deleted media item.
///
/// Returns `true` when the row was still present. A file that is already
/// gone is not an error.
pub async fn purge(pool: &PgPool, config: &ServerConfig, media: &ExpiredMedia) -> AppResult<bool> {
    if let Some(path) = storage::fs_path_for(config, &media.media_path) {
        storage::remove_file(&path).await.map_err(|e| {
            AppError::InternalError(format!("Failed to remove {}: {e}", path.display()))
        })?;
    } else {
        tracing::warn!(media_id = media.id, media_path = %media.media_path, "Unmappable media path, removing row only");
    }

    Ok(MediaRepo::hard_delete(pool, media.id).await?)
}

/// Purge every media item whose retention has elapsed at `now`.
///
/// Failures on individual items are logged and skipped. Returns the number
/// of rows removed.
pub async fn sweep(pool: &PgPool, config: &ServerConfig, now: Timestamp) -> AppResult<u64> {
    let cutoff = purge_cutoff(now, config.media_retention_days);
    let expired = MediaRepo::list_expired_soft_deleted(pool, cutoff).await?;

    let mut purged = 0;
    for media in &expired {
        match purge(pool, config, media).await {
            Ok(true) => purged += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(media_id = media.id, error = %e, "Media cleanup: purge failed");
            }
        }
    }
    Ok(purged)
}

/// Run the media cleanup loop until `cancel` is triggered.
pub async fn run(pool: PgPool, config: Arc<ServerConfig>, cancel: CancellationToken) {
    tracing::info!(
        retention_days = config.media_retention_days,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Media cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Media cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep(&pool, &config, Utc::now()).await {
                    Ok(purged) if purged > 0 => {
                        tracing::info!(purged, "Media cleanup: purged soft-deleted media");
                    }
                    Ok(_) => tracing::debug!("Media cleanup: nothing to purge"),
                    Err(e) => tracing::error!(error = %e, "Media cleanup: sweep failed"),
                }
            }
        }
    }
}
