//! Scripted content scanner
//!
//! Walks the scripted post records in order and feeds each one through
//! the real post pipeline, creating incidents on demand.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, warn};

use driftwatch_common::db::models::Post;
use driftwatch_common::Result;

use crate::db::{incidents, posts};
use crate::pipeline::{self, NewPost};
use crate::sse::SubscriptionRegistry;

use super::data::{ScriptData, ScriptedPost};

/// Upper bound on scripted posts replayed in one run.
pub const MAX_POSTS_LIMIT: usize = 100;

pub struct Scanner {
    script: Arc<ScriptData>,
    cursor: AtomicUsize,
}

impl Scanner {
    pub fn new(script: Arc<ScriptData>) -> Self {
        Scanner {
            script,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Yield the next scripted record, or None once the script (or the
    /// replay cap) is exhausted.
    pub fn next_post(&self) -> Option<ScriptedPost> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        if index >= MAX_POSTS_LIMIT {
            return None;
        }
        self.script.posts.get(index).cloned()
    }

    /// Restart the script from the first record.
    pub fn rewind(&self) {
        self.cursor.store(0, Ordering::SeqCst);
    }

    /// Number of records consumed so far.
    pub fn position(&self) -> usize {
        self.cursor
            .load(Ordering::SeqCst)
            .min(self.script.posts.len())
    }

    pub fn total_posts(&self) -> usize {
        self.script.posts.len()
    }

    /// Store a scripted record through the pipeline.
    ///
    /// The record's incident is created from the script if it is not in
    /// the database yet. A record whose id already exists is returned
    /// as-is, so restarting the loop converges instead of duplicating.
    /// A parent that never made it into the database drops the link and
    /// stores the post as a root.
    pub async fn ingest(
        &self,
        pool: &SqlitePool,
        registry: &SubscriptionRegistry,
        record: &ScriptedPost,
    ) -> Result<Post> {
        self.ensure_incident(pool, &record.incident_id).await?;

        if let Some(existing) = posts::find(pool, &record.id).await? {
            debug!("Scripted post {} already stored, skipping insert", record.id);
            return Ok(existing);
        }

        let mut parent_id = record.parent_id.clone();
        if let Some(pid) = &parent_id {
            if posts::find(pool, pid).await?.is_none() {
                warn!(
                    "Parent {} not found for scripted post {}, storing as root",
                    pid, record.id
                );
                parent_id = None;
            }
        }

        pipeline::create_post(
            pool,
            registry,
            NewPost {
                id: Some(record.id.clone()),
                incident_id: record.incident_id.clone(),
                parent_id,
                content: record.content.clone(),
                author: record.author.clone(),
                timestamp: Some(record.timestamp),
            },
        )
        .await
    }

    async fn ensure_incident(&self, pool: &SqlitePool, incident_id: &str) -> Result<()> {
        if incidents::exists(pool, incident_id).await? {
            return Ok(());
        }
        let Some(scripted) = self.script.incidents.iter().find(|i| i.id == incident_id) else {
            warn!("Scripted incident {} is not in the data file", incident_id);
            return Ok(());
        };
        incidents::create(
            pool,
            incidents::NewIncident {
                id: Some(scripted.id.clone()),
                title: scripted.title.clone(),
                severity: scripted.severity,
                location: scripted.location.clone(),
                status: Some(scripted.status.clone()),
            },
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use driftwatch_common::db::init_memory_database;
    use driftwatch_common::db::models::Severity;
    use driftwatch_common::MutationCategory;

    use crate::sim::data::{ScriptedIncident, TruthStatus};

    fn script() -> Arc<ScriptData> {
        Arc::new(ScriptData {
            incidents: vec![ScriptedIncident {
                id: "inc-1".into(),
                title: "Flash flooding".into(),
                severity: Severity::Critical,
                location: "Riverside".into(),
                status: "ACTIVE".into(),
            }],
            posts: vec![
                ScriptedPost {
                    id: "sim-1".into(),
                    incident_id: "inc-1".into(),
                    parent_id: None,
                    content: "Water levels rising slowly.".into(),
                    author: "river_watch".into(),
                    timestamp: Utc::now(),
                    truth_status: TruthStatus::True,
                },
                ScriptedPost {
                    id: "sim-2".into(),
                    incident_id: "inc-1".into(),
                    parent_id: Some("sim-1".into()),
                    content: "Water levels rising quickly!".into(),
                    author: "echo_1".into(),
                    timestamp: Utc::now(),
                    truth_status: TruthStatus::Exaggerated,
                },
            ],
        })
    }

    #[test]
    fn test_cursor_walks_script_in_order() {
        let scanner = Scanner::new(script());
        assert_eq!(scanner.next_post().unwrap().id, "sim-1");
        assert_eq!(scanner.next_post().unwrap().id, "sim-2");
        assert!(scanner.next_post().is_none());
        assert_eq!(scanner.position(), 2);

        scanner.rewind();
        assert_eq!(scanner.position(), 0);
        assert_eq!(scanner.next_post().unwrap().id, "sim-1");
    }

    #[tokio::test]
    async fn test_ingest_creates_incident_on_demand() {
        let pool = init_memory_database().await.unwrap();
        let registry = SubscriptionRegistry::new(8);
        let scanner = Scanner::new(script());

        let record = scanner.next_post().unwrap();
        let stored = scanner.ingest(&pool, &registry, &record).await.unwrap();

        assert_eq!(stored.id, "sim-1");
        assert!(incidents::exists(&pool, "inc-1").await.unwrap());
        // Root post: no drift to measure.
        assert_eq!(stored.mutation_score, 0.0);
        assert!(stored.mutation_category.is_none());
    }

    #[tokio::test]
    async fn test_ingest_scores_reply_against_parent() {
        let pool = init_memory_database().await.unwrap();
        let registry = SubscriptionRegistry::new(8);
        let scanner = Scanner::new(script());

        let root = scanner.next_post().unwrap();
        scanner.ingest(&pool, &registry, &root).await.unwrap();
        let reply = scanner.next_post().unwrap();
        let stored = scanner.ingest(&pool, &registry, &reply).await.unwrap();

        assert_eq!(stored.parent_id.as_deref(), Some("sim-1"));
        assert_eq!(stored.mutation_category, Some(MutationCategory::Moderate));
    }

    #[tokio::test]
    async fn test_ingest_skips_existing_post() {
        let pool = init_memory_database().await.unwrap();
        let registry = SubscriptionRegistry::new(8);
        let scanner = Scanner::new(script());

        let record = scanner.next_post().unwrap();
        scanner.ingest(&pool, &registry, &record).await.unwrap();
        scanner.ingest(&pool, &registry, &record).await.unwrap();

        assert_eq!(posts::count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_parent_link_dropped() {
        let pool = init_memory_database().await.unwrap();
        let registry = SubscriptionRegistry::new(8);
        let scanner = Scanner::new(script());

        // Skip straight to the reply without storing its parent.
        scanner.next_post();
        let reply = scanner.next_post().unwrap();
        let stored = scanner.ingest(&pool, &registry, &reply).await.unwrap();

        assert!(stored.parent_id.is_none());
        assert_eq!(stored.mutation_score, 0.0);
    }
}
