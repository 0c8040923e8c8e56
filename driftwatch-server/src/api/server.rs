//! HTTP server setup and routing

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use driftwatch_common::{Error, Result};

use crate::state::AppContext;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "driftwatch-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the full application router.
///
/// Kept separate from [`run`] so integration tests can drive it with
/// `tower::ServiceExt::oneshot`.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health))
        // Incidents
        .route(
            "/api/incidents",
            get(super::incidents::list_incidents).post(super::incidents::create_incident),
        )
        .route(
            "/api/incidents/:id",
            get(super::incidents::get_incident).patch(super::incidents::update_incident),
        )
        .route(
            "/api/incidents/:id/posts",
            get(super::incidents::list_incident_posts),
        )
        .route(
            "/api/incidents/:id/events",
            get(super::sse::incident_events),
        )
        // Posts
        .route("/api/posts", post(super::posts::create_post))
        .route("/api/posts/:id", get(super::posts::get_post))
        .route("/api/posts/:id/diff", get(super::posts::get_post_diff))
        .route("/api/posts/:id/vote", post(super::posts::vote_post))
        .route(
            "/api/posts/:id/comments",
            get(super::posts::list_comments).post(super::posts::create_comment),
        )
        // Analysis
        .route("/api/analyze", post(super::analyze::analyze_content))
        // Replay loop control
        .route("/api/agent/logs", get(super::agent::get_logs))
        .route("/api/agent/start", post(super::agent::start_agent))
        .route("/api/agent/stop", post(super::agent::stop_agent))
        // Demo controls
        .route("/api/demo/state", get(super::demo::get_state))
        .route("/api/demo/speed", patch(super::demo::set_speed))
        .route("/api/demo/pause", post(super::demo::pause))
        .route("/api/demo/resume", post(super::demo::resume))
        .route("/api/demo/reset", post(super::demo::reset))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Local dashboards connect from arbitrary origins
        .layer(CorsLayer::permissive())
}

/// Bind and serve until ctrl-c or SIGTERM.
pub async fn run(port: u16, ctx: AppContext) -> Result<()> {
    let app = router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install ctrl-c handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
