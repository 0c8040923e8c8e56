//! Demo control endpoints
//!
//! Speed and pause changes only write the demo state row; the replay
//! loop reads that row on every tick, so they apply without restarting
//! the task.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{demo, incidents, posts};
use crate::state::AppContext;

use super::error::{ApiError, ApiResult};
use super::StatusResponse;

pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 5.0;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoStateResponse {
    pub speed: f64,
    pub is_paused: bool,
    /// Replay progress in percent, capped at 100.
    pub progress: f64,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f64,
}

async fn state_response(ctx: &AppContext) -> ApiResult<DemoStateResponse> {
    let state = demo::get_state(&ctx.db_pool).await?;
    let total = ctx.replay.scanner().total_posts();
    let progress = if total == 0 {
        0.0
    } else {
        let percent = posts::count(&ctx.db_pool).await? as f64 / total as f64 * 100.0;
        (percent.min(100.0) * 100.0).round() / 100.0
    };
    Ok(DemoStateResponse {
        speed: state.speed,
        is_paused: state.is_paused,
        progress,
    })
}

/// GET /api/demo/state - Current speed, paused flag and replay progress
pub async fn get_state(State(ctx): State<AppContext>) -> ApiResult<Json<DemoStateResponse>> {
    Ok(Json(state_response(&ctx).await?))
}

/// PATCH /api/demo/speed - Set the replay speed multiplier
pub async fn set_speed(
    State(ctx): State<AppContext>,
    Json(req): Json<SpeedRequest>,
) -> ApiResult<Json<DemoStateResponse>> {
    if !req.speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&req.speed) {
        return Err(ApiError::BadRequest(format!(
            "speed must be between {} and {}",
            MIN_SPEED, MAX_SPEED
        )));
    }
    demo::set_speed(&ctx.db_pool, req.speed).await?;
    info!("Replay speed set to {}", req.speed);
    Ok(Json(state_response(&ctx).await?))
}

/// POST /api/demo/pause - Pause the replay loop
pub async fn pause(State(ctx): State<AppContext>) -> ApiResult<Json<DemoStateResponse>> {
    demo::set_paused(&ctx.db_pool, true).await?;
    Ok(Json(state_response(&ctx).await?))
}

/// POST /api/demo/resume - Resume the replay loop
pub async fn resume(State(ctx): State<AppContext>) -> ApiResult<Json<DemoStateResponse>> {
    demo::set_paused(&ctx.db_pool, false).await?;
    Ok(Json(state_response(&ctx).await?))
}

/// POST /api/demo/reset - Wipe all rows, re-seed incidents, rewind
pub async fn reset(State(ctx): State<AppContext>) -> ApiResult<Json<StatusResponse>> {
    demo::reset_all(&ctx.db_pool).await?;

    for scripted in &ctx.replay.script().incidents {
        incidents::create(
            &ctx.db_pool,
            incidents::NewIncident {
                id: Some(scripted.id.clone()),
                title: scripted.title.clone(),
                severity: scripted.severity,
                location: scripted.location.clone(),
                status: Some(scripted.status.clone()),
            },
        )
        .await?;
    }
    ctx.replay.scanner().rewind();

    info!("Demo reset: data wiped, incidents re-seeded, replay rewound");
    Ok(Json(StatusResponse {
        status: "reset".to_string(),
    }))
}
