//! DevPulse domain model
//!
//! Entities shared by the collectors, the analyzer and the API layer.

pub mod cards;
mod models;
mod slot;

pub use models::*;
pub use slot::Slot;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Unknown contribution level: {0}")]
    UnknownLevel(String),

    #[error("Invalid stat card URL: {0}")]
    InvalidCardUrl(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
