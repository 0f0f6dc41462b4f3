//! Word-pair (bigram) Dice coefficient.
//!
//! Each string is split on whitespace into words, and the set of adjacent word
//! pairs is compared:
//!
//! ```text
//! score = 2 * |pairs(a) ∩ pairs(b)| / (|pairs(a)| + |pairs(b)|)
//! ```
//!
//! Single-word strings have no pairs, so they only score through the identity
//! rule: byte-identical strings always score `1.0`.

use std::collections::HashSet;

use super::SimilarityMetric;

/// Bigram overlap metric.
pub struct BigramOverlap;

impl SimilarityMetric for BigramOverlap {
    fn name(&self) -> &str {
        "bigram"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        bigram_similarity(a, b)
    }
}

/// Set of adjacent word pairs, joined by a single space.
pub fn word_pairs(input: &str) -> HashSet<String> {
    let words: Vec<&str> = input.split_whitespace().collect();
    words
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect()
}

/// Dice coefficient over word pairs, in `[0.0, 1.0]`.
pub fn bigram_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let pairs_a = word_pairs(a);
    let pairs_b = word_pairs(b);
    let total = pairs_a.len() + pairs_b.len();
    if total == 0 {
        return 0.0;
    }

    let shared = pairs_a.intersection(&pairs_b).count();
    (2.0 * shared as f64) / total as f64
}
