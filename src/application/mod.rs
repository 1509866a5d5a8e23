//! Application services layer.

pub mod analytics;
pub mod auth;
pub mod channel_stats;
pub mod error;
pub mod follows;
pub mod jobs;
pub mod listings;
pub mod media;
pub mod overlay;
pub mod ports;
pub mod profile;
pub mod repos;
pub mod schedule;
pub mod search;
pub mod services;
pub mod users;
pub mod views;
