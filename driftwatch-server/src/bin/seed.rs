//! Database seeding utility
//!
//! **Usage:**
//! ```bash
//! driftwatch-seed [seed|reset] [--database <file>] [--data-file <file>]
//! ```
//!
//! `seed` (the default) inserts the scripted incidents and posts,
//! scoring each post against its parent exactly like the live
//! pipeline. `reset` wipes all rows and restores the default demo
//! state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftwatch_common::config::Settings;
use driftwatch_common::db::init_database;

use driftwatch_server::db::{demo, incidents, posts};
use driftwatch_server::sim::data;
use driftwatch_server::sim::Scanner;
use driftwatch_server::sse::SubscriptionRegistry;

/// Command-line arguments for driftwatch-seed
#[derive(Parser, Debug)]
#[command(name = "driftwatch-seed")]
#[command(about = "Seed or reset the DriftWatch database")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

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

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert scripted incidents and posts (default)
    Seed,
    /// Delete all rows and restore the default demo state
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftwatch_server=info,driftwatch_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut settings =
        Settings::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(database) = args.database {
        settings.database_path = database;
    }
    if let Some(data_file) = args.data_file {
        settings.data_file = data_file;
    }

    let pool = init_database(&settings.database_path)
        .await
        .context("Failed to initialize database")?;

    match args.command.unwrap_or(Command::Seed) {
        Command::Seed => seed(&pool, &settings.data_file).await?,
        Command::Reset => reset(&pool).await?,
    }

    Ok(())
}

async fn seed(pool: &SqlitePool, data_file: &Path) -> Result<()> {
    let script = data::load_or_empty(data_file);
    if script.incidents.is_empty() && script.posts.is_empty() {
        bail!("Nothing to seed from {}", data_file.display());
    }

    for scripted in &script.incidents {
        if incidents::exists(pool, &scripted.id).await? {
            continue;
        }
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
    }

    // Nobody is subscribed while seeding, so broadcasts are no-ops.
    let registry = SubscriptionRegistry::new(8);
    let scanner = Scanner::new(Arc::new(script));

    let before = posts::count(pool).await?;
    while let Some(record) = scanner.next_post() {
        scanner
            .ingest(pool, &registry, &record)
            .await
            .with_context(|| format!("Failed to seed post {}", record.id))?;
    }
    let created = posts::count(pool).await? - before;

    info!(
        "Seeded {} new posts ({} already present)",
        created,
        scanner.position() as i64 - created
    );
    Ok(())
}

async fn reset(pool: &SqlitePool) -> Result<()> {
    demo::reset_all(pool).await.context("Failed to reset")?;
    info!("Database reset: all rows deleted, demo state restored");
    Ok(())
}
