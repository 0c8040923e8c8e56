//! Configuration loading
//!
//! Settings resolve in priority order: command-line argument, environment
//! variable, TOML config file, compiled default. Command-line and
//! environment handling lives with the binaries (clap); this module owns
//! the TOML file and the defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CONFIG_FILE: &str = "driftwatch.toml";

/// Server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listen port
    pub port: u16,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Scripted replay data file
    pub data_file: PathBuf,
    /// Per-viewer event channel capacity; a viewer this far behind is dropped
    pub sse_buffer: usize,
    /// Generative analysis endpoint used when no stored post matches
    pub analysis_endpoint: String,
    /// API key for the analysis endpoint; absent key degrades analysis
    /// to an UNKNOWN verdict instead of failing requests
    pub analysis_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: PathBuf::from("driftwatch.db"),
            data_file: PathBuf::from("data/simulation_data.json"),
            sse_buffer: 64,
            analysis_endpoint:
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
                    .to_string(),
            analysis_api_key: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// An explicitly named file must exist and parse; the default file is
    /// optional and silently skipped when absent. The analysis API key
    /// falls back to the `GEMINI_API_KEY` environment variable when the
    /// file does not set one.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    let content = std::fs::read_to_string(path).map_err(|e| {
                        Error::Config(format!("cannot read {}: {}", path.display(), e))
                    })?;
                    let settings = toml::from_str(&content).map_err(|e| {
                        Error::Config(format!("invalid {}: {}", path.display(), e))
                    })?;
                    info!("Loaded settings from {}", path.display());
                    settings
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Settings::default()
                }
            }
        };

        if settings.analysis_api_key.is_none() {
            settings.analysis_api_key = std::env::var("GEMINI_API_KEY").ok();
        }

        Ok(settings)
    }
}
