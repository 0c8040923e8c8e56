//! Mutation scoring for reply posts
//!
//! Converts a similarity ratio into a 0-100 drift score and a coarse
//! category. 0 = identical to the parent, 100 = completely different.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::similarity;

/// Coarse drift band derived from the mutation score.
///
/// Stored as TEXT in the database and serialized in upper case on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationCategory {
    Minor,
    Moderate,
    Major,
}

impl MutationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationCategory::Minor => "MINOR",
            MutationCategory::Moderate => "MODERATE",
            MutationCategory::Major => "MAJOR",
        }
    }
}

impl fmt::Display for MutationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MINOR" => Ok(MutationCategory::Minor),
            "MODERATE" => Ok(MutationCategory::Moderate),
            "MAJOR" => Ok(MutationCategory::Major),
            other => Err(crate::Error::Validation(format!(
                "unknown mutation category: {}",
                other
            ))),
        }
    }
}

/// Category thresholds over the 0-100 score. The lower bound of each band
/// is inclusive: scores of exactly 10 and 40 land in the higher band.
pub fn category_for(score: f64) -> MutationCategory {
    if score < 10.0 {
        MutationCategory::Minor
    } else if score < 40.0 {
        MutationCategory::Moderate
    } else {
        MutationCategory::Major
    }
}

/// Score a reply against its parent's content.
///
/// An empty string on either side is treated as maximal drift rather than
/// letting the ratio report near-total similarity against nothing. Root
/// posts never reach this function; they are fixed at score 0.0 with no
/// category by the creation pipeline.
pub fn classify(parent_content: &str, child_content: &str) -> (f64, MutationCategory) {
    if parent_content.is_empty() || child_content.is_empty() {
        return (100.0, MutationCategory::Major);
    }

    let score = ((1.0 - similarity::ratio(parent_content, child_content)) * 100.0).clamp(0.0, 100.0);
    (score, category_for(score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_is_minor() {
        let (score, category) = classify("same", "same");
        assert_eq!(score, 0.0);
        assert_eq!(category, MutationCategory::Minor);
    }

    #[test]
    fn test_score_bounds() {
        let samples = [
            ("a", "b"),
            ("Water levels rising slowly.", "Water levels rising quickly!"),
            ("short", "a completely different and much longer sentence"),
            ("ü", "u"),
        ];
        for (parent, child) in samples {
            let (score, _) = classify(parent, child);
            assert!(
                (0.0..=100.0).contains(&score),
                "classify({parent:?}, {child:?}) = {score} out of range"
            );
        }
    }

    #[test]
    fn test_empty_side_is_maximal_drift() {
        assert_eq!(classify("", "anything"), (100.0, MutationCategory::Major));
        assert_eq!(classify("anything", ""), (100.0, MutationCategory::Major));
        // Both empty hits the same guard before the ratio would report identity
        assert_eq!(classify("", ""), (100.0, MutationCategory::Major));
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(category_for(0.0), MutationCategory::Minor);
        assert_eq!(category_for(9.99), MutationCategory::Minor);
        assert_eq!(category_for(10.0), MutationCategory::Moderate);
        assert_eq!(category_for(39.99), MutationCategory::Moderate);
        assert_eq!(category_for(40.0), MutationCategory::Major);
        assert_eq!(category_for(100.0), MutationCategory::Major);
    }

    #[test]
    fn test_small_edit_is_minor() {
        // One dropped character out of 27: score = 100/27 ~ 3.7
        let (score, category) = classify("Water levels rising slowly.", "Water levels rising slowly");
        assert!(score < 10.0, "score = {score}");
        assert_eq!(category, MutationCategory::Minor);
    }

    #[test]
    fn test_reworded_ending_is_moderate() {
        // Shared prefix "Water levels rising ", edit distance 6 over 28 chars:
        // score = 600/28 ~ 21.4
        let (score, category) =
            classify("Water levels rising slowly.", "Water levels rising quickly!");
        assert!((21.0..22.0).contains(&score), "score = {score}");
        assert_eq!(category, MutationCategory::Moderate);
    }

    #[test]
    fn test_contradicting_rewrite_is_major() {
        let (score, category) = classify(
            "The bridge is safe",
            "The bridge is NOT safe and people are dying",
        );
        // Insertions alone account for 25 of 43 characters: score ~ 58.1
        assert!(score >= 40.0, "score = {score}");
        assert_eq!(category, MutationCategory::Major);
    }

    #[test]
    fn test_shouted_rewrite_is_major() {
        let (score, category) = classify(
            "Water levels rising slowly.",
            "WATER LEVELS RISING DANGEROUSLY, EVACUATE NOW!!",
        );
        assert!(score > 40.0, "score = {score}");
        assert_eq!(category, MutationCategory::Major);
    }

    #[test]
    fn test_category_round_trip() {
        for category in [
            MutationCategory::Minor,
            MutationCategory::Moderate,
            MutationCategory::Major,
        ] {
            assert_eq!(category.as_str().parse::<MutationCategory>().unwrap(), category);
        }
        assert!("SEVERE".parse::<MutationCategory>().is_err());
    }

    #[test]
    fn test_wire_format_is_upper_case() {
        let json = serde_json::to_string(&MutationCategory::Moderate).unwrap();
        assert_eq!(json, "\"MODERATE\"");
        let parsed: MutationCategory = serde_json::from_str("\"MAJOR\"").unwrap();
        assert_eq!(parsed, MutationCategory::Major);
    }
}
