//! Live update events for incident viewers
//!
//! Events are broadcast per incident and serialized for SSE transmission
//! as `{"type": ..., "payload": ...}` with snake_case type tags.

use serde::{Deserialize, Serialize};

use crate::db::models::{Comment, Post};

/// Event kinds pushed to viewers subscribed to an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum IncidentEvent {
    /// A post was created under the incident (root or reply)
    NewPost(Post),

    /// A post's vote counters changed
    PostVoted(Post),

    /// A comment was added to one of the incident's posts
    #[serde(rename_all = "camelCase")]
    NewComment { comment: Comment, post_id: String },
}

impl IncidentEvent {
    /// Get event type as string for SSE event names and filtering
    pub fn event_type(&self) -> &str {
        match self {
            IncidentEvent::NewPost(_) => "new_post",
            IncidentEvent::PostVoted(_) => "post_voted",
            IncidentEvent::NewComment { .. } => "new_comment",
        }
    }
}
