pub mod directory;
pub mod media;
pub mod prediction;
pub mod session;
pub mod trial_guest;
pub mod user;
