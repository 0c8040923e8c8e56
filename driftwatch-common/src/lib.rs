//! # Driftwatch Common Library
//!
//! Shared code for the driftwatch backend including:
//! - Database schema, models and initialization
//! - Event types (IncidentEvent enum)
//! - Configuration loading
//! - Text analysis: similarity ratio, mutation scoring, diff opcodes

pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod events;
pub mod mutation;
pub mod similarity;

pub use error::{Error, Result};
pub use mutation::MutationCategory;
