pub mod auth;
pub mod directories;
pub mod media_folders;
pub mod medias;
pub mod predictions;
pub mod trial;
pub mod users;
