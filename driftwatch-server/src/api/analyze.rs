//! Content analysis endpoint

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::analysis::TruthScorecard;
use crate::state::AppContext;

use super::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
}

/// POST /api/analyze - Score arbitrary content against stored posts
///
/// Always answers 200 with a scorecard; a missing API key or a failed
/// model call degrade the scorecard instead of failing the request.
pub async fn analyze_content(
    State(ctx): State<AppContext>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<Json<TruthScorecard>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".to_string()));
    }
    let scorecard = ctx.analysis.scorecard(&ctx.db_pool, &req.content).await?;
    Ok(Json(scorecard))
}
