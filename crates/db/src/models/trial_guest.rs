//! Trial guest rows.

use breedid_core::trial::TrialState;
use breedid_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `trial_guests` table.
#[derive(Debug, Clone, FromRow)]
pub struct TrialGuest {
    pub id: DbId,
    pub fingerprint: String,
    pub ip: String,
    pub used: bool,
    pub created_at: Timestamp,
}

impl TrialGuest {
    pub fn state(&self) -> TrialState {
        TrialState::from_used_flag(self.used)
    }
}
