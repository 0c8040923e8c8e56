//! Replay loop control endpoints

use axum::{extract::State, Json};

use crate::state::{ActivityEntry, AppContext};

use super::error::ApiResult;
use super::StatusResponse;

/// GET /api/agent/logs - Activity ring, newest first
pub async fn get_logs(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<ActivityEntry>>> {
    Ok(Json(ctx.activity.entries()))
}

/// POST /api/agent/start - Start the replay loop (no-op when running)
pub async fn start_agent(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    let status = if ctx.replay.start().await {
        "started"
    } else {
        "already running"
    };
    Json(StatusResponse {
        status: status.to_string(),
    })
}

/// POST /api/agent/stop - Stop the replay loop (no-op when stopped)
pub async fn stop_agent(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    let status = if ctx.replay.stop().await {
        "stopped"
    } else {
        "not running"
    };
    Json(StatusResponse {
        status: status.to_string(),
    })
}
