//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod progress;
pub mod types;
pub mod validation;
pub mod week;
