//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod directory_repo;
pub mod media_repo;
pub mod prediction_repo;
pub mod session_repo;
pub mod trial_guest_repo;
pub mod user_repo;

pub use directory_repo::DirectoryRepo;
pub use media_repo::MediaRepo;
pub use prediction_repo::PredictionRepo;
pub use session_repo::SessionRepo;
pub use trial_guest_repo::TrialGuestRepo;
pub use user_repo::UserRepo;
