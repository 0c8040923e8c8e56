//! Cooperative replay loop
//!
//! One tokio task walks the script: scan a record, push it through the
//! pipeline, verify it, publish the verdict, sleep. Pause and speed are
//! read from the demo state row on every tick, so PATCH requests take
//! effect without restarting the task.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

use driftwatch_common::Result;

use crate::db::demo;
use crate::sse::SubscriptionRegistry;
use crate::state::{ActivityLog, AgentKind};

use super::data::ScriptData;
use super::scanner::Scanner;
use super::{publisher, verifier};

/// How long a paused loop waits before re-checking the demo state.
const PAUSED_POLL: Duration = Duration::from_secs(1);
/// Back-off after a tick fails.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Handle for starting and stopping the replay task.
pub struct ReplayControl {
    ctx: LoopCtx,
    script: Arc<ScriptData>,
    task: Mutex<Option<ReplayTask>>,
}

/// Everything one loop iteration touches; cloned into the spawned task.
#[derive(Clone)]
struct LoopCtx {
    pool: SqlitePool,
    registry: SubscriptionRegistry,
    activity: Arc<ActivityLog>,
    scanner: Arc<Scanner>,
}

struct ReplayTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ReplayControl {
    pub fn new(
        pool: SqlitePool,
        registry: SubscriptionRegistry,
        activity: Arc<ActivityLog>,
        script: ScriptData,
    ) -> Self {
        let script = Arc::new(script);
        ReplayControl {
            ctx: LoopCtx {
                pool,
                registry,
                activity,
                scanner: Arc::new(Scanner::new(Arc::clone(&script))),
            },
            script,
            task: Mutex::new(None),
        }
    }

    pub fn script(&self) -> &ScriptData {
        &self.script
    }

    pub fn scanner(&self) -> &Scanner {
        &self.ctx.scanner
    }

    /// Spawn the loop. Returns false (and does nothing) if it is
    /// already running.
    pub async fn start(&self) -> bool {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(self.ctx.clone(), shutdown_rx));
        *task = Some(ReplayTask {
            shutdown_tx,
            handle,
        });

        self.ctx
            .activity
            .record(AgentKind::System, "Started", "Autonomous agent loop started.");
        true
    }

    /// Signal the loop to finish its current tick and stop. Returns
    /// false if it was not running.
    pub async fn stop(&self) -> bool {
        let task = self.task.lock().await.take();
        let Some(task) = task else {
            return false;
        };

        let _ = task.shutdown_tx.send(true);
        if let Err(e) = task.handle.await {
            error!("Replay task panicked: {}", e);
        }

        self.ctx
            .activity
            .record(AgentKind::System, "Stopped", "Autonomous agent loop stopped.");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }
}

async fn run_loop(ctx: LoopCtx, mut shutdown: watch::Receiver<bool>) {
    info!(
        "Replay loop running, {} scripted posts queued",
        ctx.scanner.total_posts()
    );

    loop {
        let pause = match tick(&ctx).await {
            Ok(pause) => pause,
            Err(e) => {
                ctx.activity.record(AgentKind::System, "Error", e.to_string());
                if e.is_transient() {
                    ERROR_BACKOFF
                } else {
                    // The failing record is already consumed; carry on.
                    PAUSED_POLL
                }
            }
        };

        tokio::select! {
            _ = shutdown.changed() => {
                debug!("Replay loop shutting down");
                break;
            }
            _ = sleep(pause) => {}
        }
    }
}

/// Run one step of the loop and return how long to sleep before the
/// next one.
async fn tick(ctx: &LoopCtx) -> Result<Duration> {
    let state = demo::get_state(&ctx.pool).await?;
    if state.is_paused {
        return Ok(PAUSED_POLL);
    }

    // Same bounds PATCH /api/demo/speed enforces; a stale row cannot
    // stall or spin the loop.
    let speed = state.speed.clamp(0.5, 5.0);
    let delay = Duration::from_secs_f64(1.0 / speed);

    let Some(record) = ctx.scanner.next_post() else {
        // Script exhausted; idle slowly until reset or stop.
        return Ok(3 * delay);
    };

    ctx.activity.record(
        AgentKind::Scanner,
        "Detected",
        format!("New content: {}", record.id),
    );
    let post = ctx.scanner.ingest(&ctx.pool, &ctx.registry, &record).await?;
    demo::set_position(&ctx.pool, ctx.scanner.position() as i64).await?;

    ctx.activity.record(
        AgentKind::Verifier,
        "Analyzing",
        format!("Verifying {}...", record.id),
    );
    let verdict = verifier::verify(&post, record.truth_status);

    publisher::publish(&ctx.activity, &verdict);

    Ok(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_common::db::init_memory_database;
    use driftwatch_common::db::models::Severity;

    use crate::db::posts;
    use crate::sim::data::{ScriptedIncident, ScriptedPost, TruthStatus};

    fn script() -> ScriptData {
        ScriptData {
            incidents: vec![ScriptedIncident {
                id: "inc-1".into(),
                title: "Flash flooding".into(),
                severity: Severity::Critical,
                location: "Riverside".into(),
                status: "ACTIVE".into(),
            }],
            posts: vec![ScriptedPost {
                id: "sim-1".into(),
                incident_id: "inc-1".into(),
                parent_id: None,
                content: "Water levels rising slowly.".into(),
                author: "river_watch".into(),
                timestamp: chrono::Utc::now(),
                truth_status: TruthStatus::True,
            }],
        }
    }

    async fn control() -> ReplayControl {
        let pool = init_memory_database().await.unwrap();
        let registry = SubscriptionRegistry::new(8);
        let activity = Arc::new(ActivityLog::default());
        ReplayControl::new(pool, registry, activity, script())
    }

    #[tokio::test]
    async fn test_tick_processes_one_record() {
        let control = control().await;

        let pause = tick(&control.ctx).await.unwrap();
        assert_eq!(pause, Duration::from_secs(1));

        let stored = posts::get(&control.ctx.pool, "sim-1").await.unwrap();
        assert_eq!(stored.author, "river_watch");

        let state = demo::get_state(&control.ctx.pool).await.unwrap();
        assert_eq!(state.current_position, 1);

        let actions: Vec<String> = control
            .ctx
            .activity
            .entries()
            .iter()
            .map(|e| e.action.clone())
            .collect();
        // Newest first: publish, verify, detect.
        assert_eq!(actions, vec!["Publishing", "Analyzing", "Detected"]);
    }

    #[tokio::test]
    async fn test_exhausted_script_idles() {
        let control = control().await;
        tick(&control.ctx).await.unwrap();

        let pause = tick(&control.ctx).await.unwrap();
        assert_eq!(pause, 3 * Duration::from_secs(1));
        assert_eq!(posts::count(&control.ctx.pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_paused_tick_does_nothing() {
        let control = control().await;
        demo::set_paused(&control.ctx.pool, true).await.unwrap();

        let pause = tick(&control.ctx).await.unwrap();
        assert_eq!(pause, PAUSED_POLL);
        assert_eq!(posts::count(&control.ctx.pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_speed_scales_delay() {
        let control = control().await;
        demo::set_speed(&control.ctx.pool, 2.0).await.unwrap();

        let pause = tick(&control.ctx).await.unwrap();
        assert_eq!(pause, Duration::from_secs_f64(0.5));
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let control = control().await;
        demo::set_paused(&control.ctx.pool, true).await.unwrap();

        assert!(control.start().await);
        assert!(!control.start().await);
        assert!(control.is_running().await);

        assert!(control.stop().await);
        assert!(!control.stop().await);
        assert!(!control.is_running().await);

        let entries = control.ctx.activity.entries();
        assert_eq!(entries[0].action, "Stopped");
        assert!(entries.iter().any(|e| e.action == "Started"));
    }
}
