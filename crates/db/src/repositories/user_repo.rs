//! Repository for the `users` table.

use breedid_core::media::MediaKind;
use breedid_core::roles::Role;
use breedid_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, password_hash, role, directory_id, is_deleted, is_guest, \
                       photo_uploads_this_week, video_uploads_this_week, last_usage_reset_at, \
                       created_at, updated_at";

/// Name given to every user's root directory.
pub const ROOT_DIRECTORY_NAME: &str = "root";

/// Provides CRUD and usage-ledger operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user together with its root directory, returning the
    /// created row with `directory_id` populated.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user_id: DbId = sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let user = attach_root_directory(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Find a live (not soft-deleted) user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND is_deleted = false");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM users WHERE email = $1 AND is_deleted = false");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// List live users, newest first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE is_deleted = false
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_deleted = false")
            .fetch_one(pool)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash)
             WHERE id = $1 AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.password_hash)
            .fetch_optional(pool)
            .await
    }

    /// Change a user's role. Returns `true` if the row was updated.
    pub async fn set_role(pool: &PgPool, id: DbId, role: Role) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET role = $2 WHERE id = $1 AND is_deleted = false")
                .bind(id)
                .bind(role.as_str())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a user. Returns `true` if the row was updated.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_deleted = true WHERE id = $1 AND is_deleted = false")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Zero both weekly counters if the window has lapsed.
    ///
    /// The update is conditional on `last_usage_reset_at < cutoff`, so of
    /// several concurrent callers only one performs the reset. Returns the
    /// row as it stands afterwards, or `None` if the user does not exist.
    pub async fn reset_weekly_usage_if_due(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
        cutoff: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                photo_uploads_this_week = 0,
                video_uploads_this_week = 0,
                last_usage_reset_at = $2
             WHERE id = $1 AND last_usage_reset_at < $3",
        )
        .bind(id)
        .bind(now)
        .bind(cutoff)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id).await
    }

    /// Atomically add one to the counter for `kind`.
    pub async fn increment_usage(
        pool: &PgPool,
        id: DbId,
        kind: MediaKind,
    ) -> Result<(), sqlx::Error> {
        let column = match kind {
            MediaKind::Photo => "photo_uploads_this_week",
            MediaKind::Video => "video_uploads_this_week",
        };
        let query = format!("UPDATE users SET {column} = {column} + 1 WHERE id = $1");
        sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(())
    }

    /// Return the shared guest account, creating it (and its root
    /// directory) on first use.
    ///
    /// The account is identified by `is_guest`, never by email alone, so a
    /// regular account holding the guest email is not mistaken for it.
    /// Safe under concurrent first calls: the insert is `ON CONFLICT DO
    /// NOTHING` and only the inserting transaction creates the directory.
    /// Fails with `RowNotFound` when the email belongs to a regular account.
    pub async fn find_or_create_guest(
        pool: &PgPool,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let inserted: Option<DbId> = sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash, role, is_guest)
             VALUES ($1, $2, $3, 'user', true)
             ON CONFLICT DO NOTHING
             RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let user = match inserted {
            Some(user_id) => attach_root_directory(&mut tx, user_id).await?,
            None => {
                let query = format!("SELECT {COLUMNS} FROM users WHERE is_guest = true");
                sqlx::query_as::<_, User>(&query)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(user)
    }
}

/// Create the root directory for a freshly inserted user and link it.
async fn attach_root_directory(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: DbId,
) -> Result<User, sqlx::Error> {
    let directory_id: DbId = sqlx::query_scalar(
        "INSERT INTO directories (name, parent_id, creator_id)
         VALUES ($1, NULL, $2)
         RETURNING id",
    )
    .bind(ROOT_DIRECTORY_NAME)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;

    let query = format!("UPDATE users SET directory_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .bind(directory_id)
        .fetch_one(&mut **tx)
        .await
}
