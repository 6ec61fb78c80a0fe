//! Repository for the `trial_guests` table.

use breedid_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::trial_guest::TrialGuest;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, fingerprint, ip, used, created_at";

/// Provides persistence for one-time device trials.
///
/// Every lookup takes a `live_after` cutoff; rows created at or before it
/// are treated as absent even if the retention sweep has not removed them.
pub struct TrialGuestRepo;

impl TrialGuestRepo {
    /// Most recent live trial matching either the fingerprint or the IP.
    pub async fn find_live_for_device(
        pool: &PgPool,
        fingerprint: &str,
        ip: &str,
        live_after: Timestamp,
    ) -> Result<Option<TrialGuest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM trial_guests
             WHERE (fingerprint = $1 OR ip = $2) AND created_at > $3
             ORDER BY used DESC, created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, TrialGuest>(&query)
            .bind(fingerprint)
            .bind(ip)
            .bind(live_after)
            .fetch_optional(pool)
            .await
    }

    /// Find a live trial by ID.
    pub async fn find_live_by_id(
        pool: &PgPool,
        id: DbId,
        live_after: Timestamp,
    ) -> Result<Option<TrialGuest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM trial_guests WHERE id = $1 AND created_at > $2");
        sqlx::query_as::<_, TrialGuest>(&query)
            .bind(id)
            .bind(live_after)
            .fetch_optional(pool)
            .await
    }

    /// Insert a fresh, unused trial.
    pub async fn create(
        pool: &PgPool,
        fingerprint: &str,
        ip: &str,
    ) -> Result<TrialGuest, sqlx::Error> {
        let query = format!(
            "INSERT INTO trial_guests (fingerprint, ip)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrialGuest>(&query)
            .bind(fingerprint)
            .bind(ip)
            .fetch_one(pool)
            .await
    }

    /// Flip `used` from false to true.
    ///
    /// Returns `true` only for the caller that performed the transition, so
    /// two concurrent consumers of one trial cannot both succeed.
    pub async fn mark_used(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE trial_guests SET used = true WHERE id = $1 AND used = false")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete trials created at or before `cutoff`. Returns the count removed.
    pub async fn delete_created_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM trial_guests WHERE created_at <= $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
