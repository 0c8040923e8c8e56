//! Incident endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use driftwatch_common::db::models::{Incident, Post, Severity};

use crate::db::{incidents, posts};
use crate::state::AppContext;

use super::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    pub id: Option<String>,
    pub title: String,
    pub severity: String,
    pub location: String,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncidentRequest {
    pub title: Option<String>,
    pub severity: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

/// GET /api/incidents - List incidents, CRITICAL first then newest
pub async fn list_incidents(
    State(ctx): State<AppContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Incident>>> {
    let severity = params
        .severity
        .as_deref()
        .map(|s| s.parse::<Severity>())
        .transpose()?;
    let rows = incidents::list(&ctx.db_pool, severity).await?;
    Ok(Json(rows))
}

/// POST /api/incidents - Create an incident
pub async fn create_incident(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateIncidentRequest>,
) -> ApiResult<Json<Incident>> {
    let severity = req.severity.parse::<Severity>()?;
    let incident = incidents::create(
        &ctx.db_pool,
        incidents::NewIncident {
            id: req.id,
            title: req.title,
            severity,
            location: req.location,
            status: req.status,
        },
    )
    .await?;
    Ok(Json(incident))
}

/// GET /api/incidents/:id - Fetch one incident or 404
pub async fn get_incident(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Incident>> {
    let incident = incidents::get(&ctx.db_pool, &id).await?;
    Ok(Json(incident))
}

/// PATCH /api/incidents/:id - Partial update; absent fields keep their value
pub async fn update_incident(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<UpdateIncidentRequest>,
) -> ApiResult<Json<Incident>> {
    let severity = req
        .severity
        .as_deref()
        .map(|s| s.parse::<Severity>())
        .transpose()?;
    let incident = incidents::update(
        &ctx.db_pool,
        &id,
        incidents::IncidentPatch {
            title: req.title,
            severity,
            location: req.location,
            status: req.status,
        },
    )
    .await?;
    Ok(Json(incident))
}

/// GET /api/incidents/:id/posts - Posts for an incident, oldest first
pub async fn list_incident_posts(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Post>>> {
    // 404 for a bad id rather than an empty list
    incidents::get(&ctx.db_pool, &id).await?;
    let rows = posts::list_for_incident(&ctx.db_pool, &id).await?;
    Ok(Json(rows))
}
