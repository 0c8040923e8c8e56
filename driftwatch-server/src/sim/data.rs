//! Scripted replay data
//!
//! The data file carries the incidents and the ordered post records the
//! replay loop feeds through the pipeline. Records use snake_case keys
//! and RFC 3339 timestamps.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use driftwatch_common::db::models::Severity;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptData {
    #[serde(default)]
    pub incidents: Vec<ScriptedIncident>,
    #[serde(default)]
    pub posts: Vec<ScriptedPost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedIncident {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub location: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedPost {
    pub id: String,
    pub incident_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub content: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub truth_status: TruthStatus,
}

/// Scripted ground truth for a record, used by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TruthStatus {
    True,
    Exaggerated,
    False,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TruthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TruthStatus::True => "TRUE",
            TruthStatus::Exaggerated => "EXAGGERATED",
            TruthStatus::False => "FALSE",
            TruthStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Load the data file.
///
/// A missing or unreadable file logs a warning and yields an empty
/// script; the server still runs, the loop just has nothing to replay.
pub fn load_or_empty(path: &Path) -> ScriptData {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Simulation data file not found at {}: {}", path.display(), e);
            return ScriptData::default();
        }
    };

    match serde_json::from_str::<ScriptData>(&raw) {
        Ok(data) => {
            info!(
                "Loaded {} incidents and {} scripted posts from {}",
                data.incidents.len(),
                data.posts.len(),
                path.display()
            );
            data
        }
        Err(e) => {
            warn!("Invalid simulation data in {}: {}", path.display(), e);
            ScriptData::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let raw = r#"{
            "incidents": [
                {"id": "inc-1", "title": "Flash flooding", "severity": "CRITICAL",
                 "location": "Riverside", "status": "ACTIVE"}
            ],
            "posts": [
                {"id": "sim-1", "incident_id": "inc-1", "parent_id": null,
                 "content": "Water levels rising slowly.", "author": "river_watch",
                 "timestamp": "2024-03-15T10:00:00Z", "truth_status": "TRUE"},
                {"id": "sim-2", "incident_id": "inc-1", "parent_id": "sim-1",
                 "content": "Water levels rising quickly!", "author": "echo_1",
                 "timestamp": "2024-03-15T10:05:00Z", "truth_status": "EXAGGERATED"}
            ]
        }"#;

        let data: ScriptData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.incidents.len(), 1);
        assert_eq!(data.incidents[0].severity, Severity::Critical);
        assert_eq!(data.posts.len(), 2);
        assert_eq!(data.posts[0].truth_status, TruthStatus::True);
        assert_eq!(data.posts[1].parent_id.as_deref(), Some("sim-1"));
    }

    #[test]
    fn test_unknown_truth_status_tolerated() {
        let raw = r#"{"id": "sim-1", "incident_id": "inc-1",
                      "content": "x", "author": "a",
                      "timestamp": "2024-03-15T10:00:00Z",
                      "truth_status": "DISPUTED"}"#;
        let post: ScriptedPost = serde_json::from_str(raw).unwrap();
        assert_eq!(post.truth_status, TruthStatus::Unknown);
    }

    #[test]
    fn test_missing_file_yields_empty_script() {
        let data = load_or_empty(Path::new("/nonexistent/simulation_data.json"));
        assert!(data.incidents.is_empty());
        assert!(data.posts.is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"incidents": [], "posts": [
                {{"id": "sim-1", "incident_id": "inc-1",
                  "content": "x", "author": "a",
                  "timestamp": "2024-03-15T10:00:00Z"}}
            ]}}"#
        )
        .unwrap();

        let data = load_or_empty(file.path());
        assert_eq!(data.posts.len(), 1);
        assert_eq!(data.posts[0].truth_status, TruthStatus::Unknown);
    }

    #[test]
    fn test_invalid_json_yields_empty_script() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let data = load_or_empty(file.path());
        assert!(data.incidents.is_empty());
        assert!(data.posts.is_empty());
    }
}
