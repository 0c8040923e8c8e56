//! HTTP API
//!
//! Axum router split per resource, plus the per-incident SSE stream.

pub mod agent;
pub mod analyze;
pub mod demo;
pub mod error;
pub mod incidents;
pub mod posts;
pub mod server;
pub mod sse;

pub use error::{ApiError, ApiResult};
pub use server::{router, run};

use serde::Serialize;

/// Simple status payload for verb-like endpoints.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}
