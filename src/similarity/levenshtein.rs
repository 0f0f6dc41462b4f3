//! Character-level Levenshtein distance.

use super::SimilarityMetric;

/// Normalized edit-distance metric.
pub struct EditSimilarity;

impl SimilarityMetric for EditSimilarity {
    fn name(&self) -> &str {
        "levenshtein"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        edit_similarity(a, b)
    }
}

/// Minimum number of single-character insertions, deletions and substitutions
/// turning `a` into `b`. Operates on `char`s, not bytes.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two-row DP table.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `1 - distance / max(len)`; `1.0` when both strings are empty.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_empty() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
    }

    #[test]
    fn test_distance_classic() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
        assert_eq!(edit_distance("thank u", "thank you"), 2);
    }

    #[test]
    fn test_distance_counts_chars_not_bytes() {
        assert_eq!(edit_distance("café", "cafe"), 1);
        assert_eq!(edit_distance("🌙", ""), 1);
    }

    #[test]
    fn test_distance_symmetric() {
        assert_eq!(
            edit_distance("good morning", "good evening"),
            edit_distance("good evening", "good morning")
        );
    }

    #[test]
    fn test_similarity_identity_and_empty() {
        assert_eq!(edit_similarity("hello", "hello"), 1.0);
        assert_eq!(edit_similarity("", ""), 1.0);
        assert_eq!(edit_similarity("", "abc"), 0.0);
    }

    #[test]
    fn test_similarity_value() {
        let score = edit_similarity("thank u", "thank you");
        assert!((score - (1.0 - 2.0 / 9.0)).abs() < 1e-9);
    }

    #[test]
    fn test_metric_name() {
        assert_eq!(EditSimilarity.name(), "levenshtein");
    }
}
