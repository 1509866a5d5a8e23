pub mod analytics;
pub mod auth;
pub mod listings;
pub mod media;
pub mod overlay;
pub mod profile;
pub mod schedule;
pub mod search;
pub mod system;
pub mod users;
