//! Post endpoints
//!
//! Creation, voting and commenting all run through the pipeline so
//! scoring and viewer notification behave the same for API posts and
//! replayed posts.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use driftwatch_common::db::models::{Comment, Post};

use crate::db::comments;
use crate::pipeline::{self, NewComment, NewPost, PostDiff};
use crate::state::AppContext;

use super::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub id: Option<String>,
    pub incident_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub author: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub is_credible: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub author: String,
    pub content: String,
}

/// POST /api/posts - Create a post (scored against its parent)
pub async fn create_post(
    State(ctx): State<AppContext>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    let post = pipeline::create_post(
        &ctx.db_pool,
        &ctx.registry,
        NewPost {
            id: req.id,
            incident_id: req.incident_id,
            parent_id: req.parent_id,
            content: req.content,
            author: req.author,
            timestamp: req.timestamp,
        },
    )
    .await?;
    Ok(Json(post))
}

/// GET /api/posts/:id - Fetch one post or 404
pub async fn get_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    let post = crate::db::posts::get(&ctx.db_pool, &id).await?;
    Ok(Json(post))
}

/// GET /api/posts/:id/diff - Post, its parent and the opcode diff
///
/// Root posts answer with a null parent and an empty diff, not 404.
pub async fn get_post_diff(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<PostDiff>> {
    let diff = pipeline::post_diff(&ctx.db_pool, &id).await?;
    Ok(Json(diff))
}

/// POST /api/posts/:id/vote - Record a credibility vote
pub async fn vote_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Json<Post>> {
    let post = pipeline::record_vote(&ctx.db_pool, &ctx.registry, &id, req.is_credible).await?;
    Ok(Json(post))
}

/// GET /api/posts/:id/comments - Comments for a post, newest first
pub async fn list_comments(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    // 404 for a bad id rather than an empty list
    crate::db::posts::get(&ctx.db_pool, &id).await?;
    let rows = comments::list_for_post(&ctx.db_pool, &id).await?;
    Ok(Json(rows))
}

/// POST /api/posts/:id/comments - Attach a comment
pub async fn create_comment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let comment = pipeline::add_comment(
        &ctx.db_pool,
        &ctx.registry,
        &id,
        NewComment {
            author: req.author,
            content: req.content,
        },
    )
    .await?;
    Ok(Json(comment))
}
