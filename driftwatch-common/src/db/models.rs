//! Database models
//!
//! Entities serialize with the camelCase field names the HTTP API and
//! event payloads expose; columns use snake_case in the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::mutation::MutationCategory;

/// Incident severity, stored as TEXT.
///
/// Drives default display ordering: CRITICAL incidents list before
/// WARNING ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRITICAL" => Ok(Severity::Critical),
            "WARNING" => Ok(Severity::Warning),
            other => Err(crate::Error::Validation(format!(
                "unknown severity: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub location: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub incident_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub mutation_score: f64,
    pub mutation_category: Option<MutationCategory>,
    pub credible_votes: i64,
    pub total_votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Single-row replay control state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoState {
    pub speed: f64,
    pub is_paused: bool,
    pub current_position: i64,
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            speed: 1.0,
            is_paused: false,
            current_position: 0,
        }
    }
}
