//! String similarity metrics used to score a message against known phrasings.
//!
//! Two metrics are available:
//!
//! - [`BigramOverlap`]: Dice coefficient over adjacent word pairs. Favors
//!   phrase-order similarity. This is the default.
//! - [`EditSimilarity`]: normalized Levenshtein distance. Favors near-identical
//!   spelling.
//!
//! Exactly one metric gates the conversation threshold for a given engine;
//! it is picked through [`MetricKind`] in the engine config.
//!
//! All functions expect already-normalized input (see [`normalize`]).

pub mod bigram;
pub mod levenshtein;

use serde::{Deserialize, Serialize};

pub use bigram::{bigram_similarity, word_pairs, BigramOverlap};
pub use levenshtein::{edit_distance, edit_similarity, EditSimilarity};

/// A pure, deterministic similarity score in `[0.0, 1.0]`.
pub trait SimilarityMetric: Send + Sync {
    /// Metric name used in logs.
    fn name(&self) -> &str;

    /// Score two normalized strings. `1.0` means identical for this metric.
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Which similarity metric gates conversational matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Word-pair Dice coefficient.
    #[default]
    Bigram,
    /// Normalized character edit distance.
    Levenshtein,
}

impl MetricKind {
    /// Build the metric implementation for this kind.
    pub fn build(self) -> Box<dyn SimilarityMetric> {
        match self {
            MetricKind::Bigram => Box::new(BigramOverlap),
            MetricKind::Levenshtein => Box::new(EditSimilarity),
        }
    }

    /// Stable lowercase name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Bigram => "bigram",
            MetricKind::Levenshtein => "levenshtein",
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bigram" | "dice" => Ok(MetricKind::Bigram),
            "levenshtein" | "edit" => Ok(MetricKind::Levenshtein),
            other => Err(format!("unknown similarity metric '{}'", other)),
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-case and trim a string for matching.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}
