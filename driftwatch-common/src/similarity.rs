//! Text similarity scoring
//!
//! Foundation for mutation scoring and duplicate-content matching. The
//! ratio is a pure function of the two inputs; content is compared as-is
//! with no case folding or whitespace normalization.

/// Normalized similarity ratio between two texts, in [0.0, 1.0].
///
/// 1.0 means the strings are identical (two empty strings included),
/// 0.0 means nothing survives between them. Symmetric in its arguments.
pub fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}
