//! Character-level diff opcodes
//!
//! Produces an ordered run of edit operations describing how a reply's text
//! relates to its parent's. Each opcode covers a contiguous character span
//! on each side; the spans partition both strings end-to-end with no gaps
//! and no overlaps, so viewers can render either side by walking the list.
//!
//! Opcodes are recomputed from stored content on every request; nothing
//! here is persisted.

use serde::{Deserialize, Serialize};

/// Edit operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffTag {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// One opcode: `[tag, a_start, a_end, b_start, b_end]` over character
/// indices, where `a` is the parent text and `b` the child text.
///
/// Serialized as a JSON array; viewers destructure it positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOp(pub DiffTag, pub usize, pub usize, pub usize, pub usize);

impl DiffOp {
    pub fn tag(&self) -> DiffTag {
        self.0
    }

    /// Span of the parent text this opcode covers (empty for inserts).
    pub fn a_range(&self) -> (usize, usize) {
        (self.1, self.2)
    }

    /// Span of the child text this opcode covers (empty for deletes).
    pub fn b_range(&self) -> (usize, usize) {
        (self.3, self.4)
    }
}

/// Compute the opcodes transforming `a` into `b`.
///
/// Uses a full edit-distance matrix with backtrace, merging consecutive
/// steps of the same kind into one opcode. Two identical strings yield a
/// single `equal` opcode; two empty strings yield an empty list.
pub fn opcodes(a: &str, b: &str) -> Vec<DiffOp> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let m = a.len();
    let n = b.len();

    if m == 0 && n == 0 {
        return Vec::new();
    }

    let mut dist = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dist.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dist[0][j] = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            let substitute = dist[i - 1][j - 1] + usize::from(a[i - 1] != b[j - 1]);
            dist[i][j] = substitute
                .min(dist[i - 1][j] + 1)
                .min(dist[i][j - 1] + 1);
        }
    }

    // Walk back from the corner, preferring matches, then substitutions.
    let mut steps: Vec<DiffTag> = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && a[i - 1] == b[j - 1] && dist[i][j] == dist[i - 1][j - 1] {
            steps.push(DiffTag::Equal);
            i -= 1;
            j -= 1;
        } else if i > 0 && j > 0 && dist[i][j] == dist[i - 1][j - 1] + 1 {
            steps.push(DiffTag::Replace);
            i -= 1;
            j -= 1;
        } else if i > 0 && dist[i][j] == dist[i - 1][j] + 1 {
            steps.push(DiffTag::Delete);
            i -= 1;
        } else {
            steps.push(DiffTag::Insert);
            j -= 1;
        }
    }
    steps.reverse();

    // Merge runs of the same kind into contiguous ranges.
    let mut ops: Vec<DiffOp> = Vec::new();
    let (mut ai, mut bi) = (0usize, 0usize);
    for tag in steps {
        let (da, db) = match tag {
            DiffTag::Equal | DiffTag::Replace => (1, 1),
            DiffTag::Delete => (1, 0),
            DiffTag::Insert => (0, 1),
        };
        match ops.last_mut() {
            Some(op) if op.0 == tag => {
                op.2 += da;
                op.4 += db;
            }
            _ => ops.push(DiffOp(tag, ai, ai + da, bi, bi + db)),
        }
        ai += da;
        bi += db;
    }
    ops
}
