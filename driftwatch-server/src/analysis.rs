//! Truth scorecard analysis
//!
//! Checks submitted content against stored posts first; only content
//! with no close match goes to the external generative model. The
//! endpoint never fails because the model is unreachable or unkeyed;
//! the scorecard degrades to an UNKNOWN verdict instead.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, warn};

use driftwatch_common::db::models::Post;
use driftwatch_common::{similarity, Result};

use crate::db::posts;

/// Matches at or above this ratio count as known content.
pub const MATCH_THRESHOLD: f64 = 0.8;
/// Matches above this ratio are flagged HIGH risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.9;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Scorecard returned by `POST /api/analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct TruthScorecard {
    pub match_percentage: i64,
    pub risk_level: String,
    pub related_posts: Vec<RelatedPost>,
    pub analysis: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedPost {
    pub id: String,
    pub title: String,
    pub similarity: f64,
}

/// Verdict shape the generative model is asked to produce.
#[derive(Debug, Clone, Deserialize)]
struct AiVerdict {
    risk_level: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default = "no_analysis")]
    analysis: String,
}

fn no_analysis() -> String {
    "No analysis available.".to_string()
}

/// Client for the generative analysis endpoint.
pub struct AnalysisClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AnalysisClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("No analysis API key configured; unmatched content degrades to UNKNOWN");
        }
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            endpoint,
            api_key,
        }
    }

    /// Build the scorecard for a piece of content.
    pub async fn scorecard(&self, pool: &SqlitePool, content: &str) -> Result<TruthScorecard> {
        let matches = find_similar_posts(pool, content, MATCH_THRESHOLD).await?;

        if let Some((_, top_similarity)) = matches.first() {
            let risk_level = if *top_similarity > HIGH_RISK_THRESHOLD {
                "HIGH"
            } else {
                "MEDIUM"
            };
            return Ok(TruthScorecard {
                match_percentage: (top_similarity * 100.0) as i64,
                risk_level: risk_level.to_string(),
                related_posts: matches
                    .iter()
                    .take(3)
                    .map(|(post, similarity)| RelatedPost {
                        id: post.id.clone(),
                        title: short_title(&post.id),
                        similarity: *similarity,
                    })
                    .collect(),
                analysis: "Matches existing content in our knowledge base.".to_string(),
            });
        }

        let verdict = self.generative_verdict(content).await;
        Ok(TruthScorecard {
            match_percentage: (verdict.confidence * 100.0) as i64,
            risk_level: verdict.risk_level,
            related_posts: Vec::new(),
            analysis: verdict.analysis,
        })
    }

    /// Ask the generative model for a verdict. Infallible: every failure
    /// path collapses into an UNKNOWN verdict.
    async fn generative_verdict(&self, content: &str) -> AiVerdict {
        let Some(api_key) = self.api_key.as_deref() else {
            return AiVerdict {
                risk_level: "UNKNOWN".to_string(),
                confidence: 0.0,
                analysis: "AI service unavailable. Please check API configuration.".to_string(),
            };
        };

        match self.call_model(api_key, content).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Generative analysis failed: {}", e);
                AiVerdict {
                    risk_level: "UNKNOWN".to_string(),
                    confidence: 0.0,
                    analysis: format!("Error during analysis: {}", e),
                }
            }
        }
    }

    async fn call_model(&self, api_key: &str, content: &str) -> Result<AiVerdict> {
        let prompt = format!(
            "Analyze the following social media post or news snippet for potential \
             misinformation, alarmism, or risk to public order.\n\n\
             Content: \"{content}\"\n\n\
             Provide the output in the following JSON format ONLY (no markdown code blocks):\n\
             {{\n\
                 \"risk_level\": \"LOW\" | \"MEDIUM\" | \"HIGH\",\n\
                 \"confidence\": <float between 0.0 and 1.0>,\n\
                 \"analysis\": \"<brief explanation of why this risk level was assigned>\"\n\
             }}"
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(format!("{}?key={}", self.endpoint, api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| driftwatch_common::Error::Analysis(e.to_string()))?
            .error_for_status()
            .map_err(|e| driftwatch_common::Error::Analysis(e.to_string()))?;

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| driftwatch_common::Error::Analysis(e.to_string()))?;

        let text = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                driftwatch_common::Error::Analysis("model response had no text part".to_string())
            })?;

        let verdict: AiVerdict = serde_json::from_str(strip_fences(text))
            .map_err(|e| driftwatch_common::Error::Analysis(format!("bad verdict JSON: {e}")))?;

        debug!("Generative verdict: {} ({})", verdict.risk_level, verdict.confidence);
        Ok(verdict)
    }
}

/// Scan every stored post, keeping matches at or above the threshold,
/// best first. Linear; acceptable at demo scale.
pub async fn find_similar_posts(
    pool: &SqlitePool,
    content: &str,
    threshold: f64,
) -> Result<Vec<(Post, f64)>> {
    let all_posts = posts::list_all(pool).await?;

    let mut matches: Vec<(Post, f64)> = all_posts
        .into_iter()
        .filter_map(|post| {
            let ratio = similarity::ratio(content, &post.content);
            (ratio >= threshold).then_some((post, ratio))
        })
        .collect();

    matches.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(matches)
}

/// Posts have no title; the UI labels them by a shortened id.
fn short_title(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("Post {}...", prefix)
}

/// Models often wrap JSON in markdown fences despite instructions.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
