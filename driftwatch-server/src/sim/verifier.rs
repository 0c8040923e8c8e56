//! Scripted verdict mapping

use driftwatch_common::db::models::Post;

use super::data::TruthStatus;

/// Outcome of verifying one scripted post.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub post_id: String,
    pub truth_status: TruthStatus,
    pub confidence: f64,
    pub explanation: String,
}

/// Map a record's scripted truth status onto a confidence and an
/// explanation quoting the drift numbers the pipeline computed.
pub fn verify(post: &Post, truth_status: TruthStatus) -> Verdict {
    let category = post
        .mutation_category
        .map(|c| c.as_str())
        .unwrap_or("NONE");

    let (confidence, explanation) = match truth_status {
        TruthStatus::True => (
            0.95,
            "Content matches verified sources. No significant mutations detected.".to_string(),
        ),
        TruthStatus::Exaggerated => (
            0.75,
            format!(
                "Content shows signs of emotional manipulation ({}). Mutation score: {}.",
                category, post.mutation_score
            ),
        ),
        TruthStatus::False => (
            0.90,
            format!(
                "Content contradicts known facts. High mutation score ({}) indicates fabrication.",
                post.mutation_score
            ),
        ),
        TruthStatus::Unknown => (0.50, "Insufficient data to verify this claim.".to_string()),
    };

    Verdict {
        post_id: post.id.clone(),
        truth_status,
        confidence,
        explanation,
    }
}
