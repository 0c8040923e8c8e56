//! Verdict publication
//!
//! The stored post keeps the score the pipeline computed at creation;
//! publishing only records the verdict in the activity ring.

use tracing::debug;

use crate::state::{ActivityLog, AgentKind};

use super::verifier::Verdict;

pub fn publish(activity: &ActivityLog, verdict: &Verdict) {
    activity.record(
        AgentKind::Publisher,
        "Publishing",
        format!(
            "Result for {}: {}",
            verdict.post_id,
            verdict.truth_status.as_str()
        ),
    );
    debug!(
        "Verdict for {} (confidence {}): {}",
        verdict.post_id, verdict.confidence, verdict.explanation
    );
}
