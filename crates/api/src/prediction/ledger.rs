use breedid_core::error::CoreError;
use breedid_core::media::MediaKind;
use breedid_core::types::DbId;
use breedid_core::usage::{evaluate, reset_cutoff, QuotaDecision, QuotaPolicy};
use breedid_db::models::user::User;
use breedid_db::repositories::UserRepo;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppResult;

/// Apply any due weekly reset, then check the ceiling for `kind`.
///
/// Returns the user as stored after the reset so callers see fresh counters.
pub async fn check(
    pool: &PgPool,
    policy: &QuotaPolicy,
    user_id: DbId,
    kind: MediaKind,
) -> AppResult<User> {
    let now = Utc::now();
    let user = UserRepo::reset_weekly_usage_if_due(pool, user_id, now, reset_cutoff(now))
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;

    match evaluate(user.role(), &user.usage(), kind, policy) {
        QuotaDecision::Allow => Ok(user),
        QuotaDecision::Deny(reason) => {
            tracing::info!(user_id, kind = kind.as_str(), "Weekly quota exhausted");
            Err(CoreError::TooManyRequests(reason).into())
        }
    }
}

/// Charge one use of `kind`. Call only after the prediction succeeded.
pub async fn consume(pool: &PgPool, user_id: DbId, kind: MediaKind) -> AppResult<()> {
    UserRepo::increment_usage(pool, user_id, kind).await?;
    Ok(())
}
