//! Weekly usage ledger rules.
//!
//! The ledger is evaluated in two steps: an optional lazy reset of the weekly
//! window, then a ceiling check. Consumption (incrementing a counter) is done
//! by the caller only after the downstream prediction succeeded.

use chrono::Duration;

use crate::media::MediaKind;
use crate::roles::Role;
use crate::types::Timestamp;

/// Length of one usage window.
pub const USAGE_WINDOW_DAYS: i64 = 7;

/// Default weekly photo ceiling for the `user` role.
pub const DEFAULT_PHOTO_WEEKLY_LIMIT: i32 = 100;

/// Default weekly video ceiling for the `user` role.
pub const DEFAULT_VIDEO_WEEKLY_LIMIT: i32 = 5;

/// Ceilings applied to the `user` role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub photo_per_week: i32,
    pub video_per_week: i32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            photo_per_week: DEFAULT_PHOTO_WEEKLY_LIMIT,
            video_per_week: DEFAULT_VIDEO_WEEKLY_LIMIT,
        }
    }
}

impl QuotaPolicy {
    pub fn limit_for(&self, kind: MediaKind) -> i32 {
        match kind {
            MediaKind::Photo => self.photo_per_week,
            MediaKind::Video => self.video_per_week,
        }
    }
}

/// Counter snapshot as read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageCounters {
    pub photo_uploads_this_week: i32,
    pub video_uploads_this_week: i32,
    pub last_usage_reset_at: Timestamp,
}

impl UsageCounters {
    pub fn used(&self, kind: MediaKind) -> i32 {
        match kind {
            MediaKind::Photo => self.photo_uploads_this_week,
            MediaKind::Video => self.video_uploads_this_week,
        }
    }
}

/// Outcome of a ceiling check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow,
    Deny(String),
}

/// `true` when strictly more than one window has elapsed since the last reset.
pub fn needs_reset(last_reset_at: Timestamp, now: Timestamp) -> bool {
    now - last_reset_at > Duration::days(USAGE_WINDOW_DAYS)
}

/// Oldest `last_usage_reset_at` that is still inside the current window.
pub fn reset_cutoff(now: Timestamp) -> Timestamp {
    now - Duration::days(USAGE_WINDOW_DAYS)
}

/// Check a role's counters against the policy. The counters must already
/// reflect any pending weekly reset.
pub fn evaluate(
    role: Role,
    counters: &UsageCounters,
    kind: MediaKind,
    policy: &QuotaPolicy,
) -> QuotaDecision {
    if role.is_unlimited() {
        return QuotaDecision::Allow;
    }

    let limit = policy.limit_for(kind);
    let used = counters.used(kind);
    if used >= limit {
        let unit = match kind {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        };
        return QuotaDecision::Deny(format!(
            "Weekly {unit} limit of {limit} reached (0 remaining). Upgrade to Premium for unlimited use."
        ));
    }
    QuotaDecision::Allow
}

/// Remaining uses for a kind, `None` when unlimited.
pub fn remaining(
    role: Role,
    counters: &UsageCounters,
    kind: MediaKind,
    policy: &QuotaPolicy,
) -> Option<i32> {
    if role.is_unlimited() {
        return None;
    }
    Some((policy.limit_for(kind) - counters.used(kind)).max(0))
}
