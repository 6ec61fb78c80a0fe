//! Periodic deletion of expired trial grants.
//!
//! Lookups already ignore trials past their retention window; this job only
//! reclaims the rows.

use std::time::Duration;

use breedid_core::trial::expiry_cutoff;
use breedid_db::repositories::TrialGuestRepo;
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the retention job runs.
const RETENTION_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the trial retention loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = RETENTION_INTERVAL.as_secs(),
        "Trial retention job started"
    );

    let mut interval = tokio::time::interval(RETENTION_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Trial retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match TrialGuestRepo::delete_created_before(&pool, expiry_cutoff(Utc::now())).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Trial retention: removed expired trials");
                    }
                    Ok(_) => tracing::debug!("Trial retention: no expired trials"),
                    Err(e) => tracing::error!(error = %e, "Trial retention: cleanup failed"),
                }
            }
        }
    }
}
