//! creatorhub: a self-hosted hub for content creators.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
