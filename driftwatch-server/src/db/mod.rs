//! Database access layer
//!
//! Queries for incidents, posts, comments, and the demo state row.

pub mod comments;
pub mod demo;
pub mod incidents;
pub mod posts;
