//! Shared server state
//!
//! Everything handlers and the replay loop share: the database pool, the
//! per-incident viewer registry, the replay control handle, and the
//! in-memory activity ring shown by `GET /api/agent/logs`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use crate::analysis::AnalysisClient;
use crate::sim::ReplayControl;
use crate::sse::SubscriptionRegistry;

/// Shared application context passed to all handlers
///
/// Clone is cheap; every field is a pool, a shared-map handle, or an
/// Arc.
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: SqlitePool,
    pub registry: SubscriptionRegistry,
    pub activity: Arc<ActivityLog>,
    pub replay: Arc<ReplayControl>,
    pub analysis: Arc<AnalysisClient>,
}

/// Which loop participant produced an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentKind {
    Scanner,
    Verifier,
    Publisher,
    System,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Scanner => "SCANNER",
            AgentKind::Verifier => "VERIFIER",
            AgentKind::Publisher => "PUBLISHER",
            AgentKind::System => "SYSTEM",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the replay loop activity ring.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: String,
    pub agent: AgentKind,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// Most-recent-first ring of replay loop activity.
///
/// Bounded; old entries fall off the back. Lock is held only for the
/// push or the snapshot copy, never across an await.
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record one entry at the front of the ring.
    pub fn record(&self, agent: AgentKind, action: &str, details: impl Into<String>) {
        let details = details.into();
        info!("[{}] {}: {}", agent, action, details);

        let entry = ActivityEntry {
            id: Uuid::new_v4().to_string(),
            agent,
            action: action.to_string(),
            details,
            timestamp: Utc::now(),
        };

        let mut entries = self.entries.lock().unwrap();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Snapshot of the ring, newest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
