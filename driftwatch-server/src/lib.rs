//! # DriftWatch Server
//!
//! Tracks how claims mutate as they spread through incident post
//! threads. Stores incidents and their posts, scores each reply's
//! drift from its parent, streams live updates to per-incident SSE
//! viewers, and can replay scripted scenarios through the same
//! pipeline that serves API-created posts.

pub mod analysis;
pub mod api;
pub mod db;
pub mod pipeline;
pub mod sim;
pub mod sse;
pub mod state;

pub use state::AppContext;
