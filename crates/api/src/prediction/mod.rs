//! Prediction flow: who pays for a prediction, and the orchestration of
//! ingestion, inference and history around it.
//!
//! - [`ledger`] -- weekly quota check and consumption for registered users.
//! - [`trial_gate`] -- one-time trial issuance, admission and consumption.
//! - [`orchestrator`] -- the end-to-end prediction with compensation.

pub mod ledger;
pub mod orchestrator;
pub mod trial_gate;
