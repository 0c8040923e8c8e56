//! DriftWatch server - main entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftwatch_common::config::Settings;
use driftwatch_common::db::init_database;

use driftwatch_server::analysis::AnalysisClient;
use driftwatch_server::api;
use driftwatch_server::sim::{self, ReplayControl};
use driftwatch_server::sse::SubscriptionRegistry;
use driftwatch_server::state::{ActivityLog, AppContext};

/// Command-line arguments for driftwatch-server
#[derive(Parser, Debug)]
#[command(name = "driftwatch-server")]
#[command(about = "Incident information drift tracker")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "DRIFTWATCH_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "DRIFTWATCH_DB")]
    database: Option<PathBuf>,

    /// Scripted simulation data file
    #[arg(long, env = "DRIFTWATCH_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "DRIFTWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "driftwatch_server=debug,driftwatch_common=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Command-line flags override the config file
    let mut settings =
        Settings::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(database) = args.database {
        settings.database_path = database;
    }
    if let Some(data_file) = args.data_file {
        settings.data_file = data_file;
    }

    info!(
        "Starting DriftWatch server v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        settings.port
    );
    info!("Database: {}", settings.database_path.display());

    let db_pool = init_database(&settings.database_path)
        .await
        .context("Failed to initialize database")?;

    let script = sim::data::load_or_empty(&settings.data_file);

    let registry = SubscriptionRegistry::new(settings.sse_buffer);
    let activity = Arc::new(ActivityLog::default());
    let replay = Arc::new(ReplayControl::new(
        db_pool.clone(),
        registry.clone(),
        Arc::clone(&activity),
        script,
    ));
    let analysis = Arc::new(AnalysisClient::new(
        settings.analysis_endpoint.clone(),
        settings.analysis_api_key.clone(),
    ));

    let ctx = AppContext {
        db_pool,
        registry,
        activity,
        replay: Arc::clone(&replay),
        analysis,
    };

    replay.start().await;

    api::run(settings.port, ctx).await.context("Server error")?;

    replay.stop().await;
    info!("Server shutdown complete");
    Ok(())
}
