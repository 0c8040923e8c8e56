//! Post mutation pipeline
//!
//! Every post enters through `create_post`, whether it came from the
//! HTTP API or the scripted replay loop: Received → ParentLookup →
//! Scored → Persisted → Broadcast. A storage failure aborts before the
//! broadcast step, so viewers never see a post that was not stored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use driftwatch_common::db::models::{Comment, Post};
use driftwatch_common::diff::{self, DiffOp};
use driftwatch_common::events::IncidentEvent;
use driftwatch_common::mutation;
use driftwatch_common::{Error, Result};

use crate::db::{comments, incidents, posts};
use crate::sse::SubscriptionRegistry;

/// Fields accepted when creating a post.
///
/// Scripted records supply their own id and timestamp; API callers
/// leave both unset.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: Option<String>,
    pub incident_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub author: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Fields accepted when creating a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub author: String,
    pub content: String,
}

/// A post next to the parent it drifted from, with the opcodes mapping
/// one content onto the other. Root posts have no parent and an empty
/// diff.
#[derive(Debug, Clone, Serialize)]
pub struct PostDiff {
    pub post: Post,
    pub parent: Option<Post>,
    pub diff: Vec<DiffOp>,
}

/// Create a post, scoring it against its parent.
pub async fn create_post(
    pool: &SqlitePool,
    registry: &SubscriptionRegistry,
    new: NewPost,
) -> Result<Post> {
    if !incidents::exists(pool, &new.incident_id).await? {
        return Err(Error::NotFound(format!("incident {}", new.incident_id)));
    }

    // Parent snapshot is read once; post content never changes after
    // insert, so the score stays consistent with what was compared.
    let parent = match new.parent_id.as_deref() {
        Some(parent_id) => {
            let parent = posts::get(pool, parent_id).await?;
            if parent.incident_id != new.incident_id {
                return Err(Error::Validation(format!(
                    "parent {} belongs to incident {}, not {}",
                    parent_id, parent.incident_id, new.incident_id
                )));
            }
            Some(parent)
        }
        None => None,
    };

    let (mutation_score, mutation_category) = match &parent {
        Some(parent) => {
            let (score, category) = mutation::classify(&parent.content, &new.content);
            (score, Some(category))
        }
        None => (0.0, None),
    };

    let post = Post {
        id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        incident_id: new.incident_id,
        parent_id: new.parent_id,
        content: new.content,
        author: new.author,
        timestamp: new.timestamp.unwrap_or_else(Utc::now),
        mutation_score,
        mutation_category,
        credible_votes: 0,
        total_votes: 0,
    };

    posts::insert(pool, &post).await?;

    registry.broadcast(&post.incident_id, &IncidentEvent::NewPost(post.clone()));

    Ok(post)
}

/// Record a credibility vote and notify the incident's viewers.
pub async fn record_vote(
    pool: &SqlitePool,
    registry: &SubscriptionRegistry,
    post_id: &str,
    is_credible: bool,
) -> Result<Post> {
    let post = posts::record_vote(pool, post_id, is_credible).await?;

    registry.broadcast(&post.incident_id, &IncidentEvent::PostVoted(post.clone()));

    Ok(post)
}

/// Attach a comment to a post and notify the incident's viewers.
pub async fn add_comment(
    pool: &SqlitePool,
    registry: &SubscriptionRegistry,
    post_id: &str,
    new: NewComment,
) -> Result<Comment> {
    let post = posts::get(pool, post_id).await?;

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        post_id: post_id.to_string(),
        author: new.author,
        content: new.content,
        created_at: Utc::now(),
    };
    comments::insert(pool, &comment).await?;

    registry.broadcast(
        &post.incident_id,
        &IncidentEvent::NewComment {
            comment: comment.clone(),
            post_id: post_id.to_string(),
        },
    );

    Ok(comment)
}

/// Fetch a post with its parent and the opcode diff between them.
pub async fn post_diff(pool: &SqlitePool, post_id: &str) -> Result<PostDiff> {
    let post = posts::get(pool, post_id).await?;

    let parent = match post.parent_id.as_deref() {
        Some(parent_id) => posts::find(pool, parent_id).await?,
        None => None,
    };

    let ops = parent
        .as_ref()
        .map(|p| diff::opcodes(&p.content, &post.content))
        .unwrap_or_default();

    Ok(PostDiff {
        post,
        parent,
        diff: ops,
    })
}
