//! Trial gate state machine.
//!
//! A trial moves `Unissued -> Issued -> Used` and never back. The persisted
//! form is a `trial_guests` row with a `used` flag; `Unissued` is the absence
//! of a live row for the device.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Trials (and their cookies) live this long regardless of use.
pub const TRIAL_RETENTION_DAYS: i64 = 7;

/// Name of the cookie carrying the signed trial token.
pub const TRIAL_COOKIE_NAME: &str = "trial_token";

/// Message returned whenever a consumed trial is presented again.
pub const TRIAL_USED_MESSAGE: &str = "Trial has already been used.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialState {
    Unissued,
    Issued,
    Used,
}

impl TrialState {
    pub fn from_used_flag(used: bool) -> Self {
        if used {
            TrialState::Used
        } else {
            TrialState::Issued
        }
    }

    /// Transition taken on a first unauthenticated visit.
    pub fn issue(self) -> Result<Self, CoreError> {
        match self {
            TrialState::Unissued => Ok(TrialState::Issued),
            TrialState::Issued => Ok(TrialState::Issued),
            TrialState::Used => Err(CoreError::Forbidden(TRIAL_USED_MESSAGE.into())),
        }
    }

    /// Transition taken together with a successful prediction.
    pub fn consume(self) -> Result<Self, CoreError> {
        match self {
            TrialState::Issued => Ok(TrialState::Used),
            TrialState::Used => Err(CoreError::Forbidden(TRIAL_USED_MESSAGE.into())),
            TrialState::Unissued => Err(CoreError::Unauthorized(
                "No trial has been started for this device.".into(),
            )),
        }
    }
}

/// Trials created before this instant are expired.
pub fn expiry_cutoff(now: Timestamp) -> Timestamp {
    now - Duration::days(TRIAL_RETENTION_DAYS)
}

pub fn is_live(created_at: Timestamp, now: Timestamp) -> bool {
    created_at > expiry_cutoff(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    #[test]
    fn full_lifecycle() {
        let issued = TrialState::Unissued.issue().unwrap();
        assert_eq!(issued, TrialState::Issued);
        assert_eq!(issued.consume().unwrap(), TrialState::Used);
    }

    #[test]
    fn used_trial_cannot_be_consumed_or_reissued() {
        assert_matches!(TrialState::Used.consume(), Err(CoreError::Forbidden(m)) if m == TRIAL_USED_MESSAGE);
        assert_matches!(TrialState::Used.issue(), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn unissued_trial_cannot_be_consumed() {
        assert_matches!(TrialState::Unissued.consume(), Err(CoreError::Unauthorized(_)));
    }

    #[test]
    fn retention_window() {
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();
        assert!(is_live(now - Duration::days(6), now));
        assert!(!is_live(now - Duration::days(7), now));
        assert!(!is_live(now - Duration::days(30), now));
    }
}
