//! Deferred physical cleanup of soft-deleted media.
//!
//! Soft-deleted media rows keep their file on disk until they have been
//! deleted for longer than the retention period. The job that purges them is
//! split into a listing step (driven by [`purge_cutoff`]) and an idempotent
//! per-row purge so each can be exercised without the scheduler.

use chrono::Duration;

use crate::types::Timestamp;

/// Default number of days a soft-deleted media file is kept.
pub const DEFAULT_MEDIA_RETENTION_DAYS: i64 = 30;

/// Rows soft-deleted at or before this instant are eligible for purging.
pub fn purge_cutoff(now: Timestamp, retention_days: i64) -> Timestamp {
    now - Duration::days(retention_days)
}
