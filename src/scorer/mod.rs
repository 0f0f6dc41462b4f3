//! Candidate scoring.
//!
//! For one message, the scorer produces:
//!
//! - a score per conversational entry: the best similarity over the entry's
//!   canonical input and variations, forced to `1.0` on a literal match;
//! - the first math-indicator token contained in the message, if any.
//!
//! Both halves are always computed. Deciding between them is the
//! [`ResolutionPolicy`](crate::policy::ResolutionPolicy)'s job.
//!
//! The literal match and the math scan always see the whole message. An
//! optional length cap only applies to fuzzy scoring: messages longer than
//! the cap get a fuzzy score of `0.0` for every entry.

use tracing::warn;

use crate::corpus::{ConversationalEntry, CorpusIndex, MathHit};
use crate::similarity::{normalize, MetricKind, SimilarityMetric};

/// Score of one corpus entry against a message.
#[derive(Debug, Clone, Copy)]
pub struct CandidateScore<'a> {
    /// The scored entry (borrowed from the corpus).
    pub entry: &'a ConversationalEntry,
    /// Best similarity over all phrasings, in `[0.0, 1.0]`.
    pub score: f64,
    /// Whether a phrasing matched the normalized message literally.
    pub exact: bool,
}

/// Everything the policy needs to decide.
#[derive(Debug, Clone, Default)]
pub struct ScoreTable<'a> {
    /// One score per entry, in corpus load order.
    pub conversation_scores: Vec<CandidateScore<'a>>,
    /// First math token found, by declaration order.
    pub math_hit: Option<MathHit<'a>>,
}

/// Scores messages with one configured similarity metric.
pub struct CandidateScorer {
    metric: Box<dyn SimilarityMetric>,
    fuzzy_limit: Option<usize>,
}

impl CandidateScorer {
    pub fn new(kind: MetricKind) -> Self {
        Self::with_metric(kind.build())
    }

    /// Use a custom metric implementation.
    pub fn with_metric(metric: Box<dyn SimilarityMetric>) -> Self {
        Self {
            metric,
            fuzzy_limit: None,
        }
    }

    /// Skip fuzzy scoring for normalized messages longer than `max_chars`.
    pub fn with_fuzzy_limit(mut self, max_chars: usize) -> Self {
        self.fuzzy_limit = Some(max_chars.max(1));
        self
    }

    pub fn metric_name(&self) -> &str {
        self.metric.name()
    }

    /// Score a raw message against every entry of `corpus`.
    pub fn score<'a>(&self, corpus: &'a CorpusIndex, input: &str) -> ScoreTable<'a> {
        let normalized = normalize(input);
        if normalized.is_empty() {
            return ScoreTable {
                conversation_scores: corpus
                    .all_entries()
                    .iter()
                    .map(|entry| CandidateScore {
                        entry,
                        score: 0.0,
                        exact: false,
                    })
                    .collect(),
                math_hit: None,
            };
        }

        let fuzzy = match self.fuzzy_limit {
            Some(limit) if normalized.chars().nth(limit).is_some() => {
                warn!(limit, "Message exceeds input limit, skipping fuzzy scoring");
                false
            }
            _ => true,
        };

        let conversation_scores = corpus
            .all_entries()
            .iter()
            .map(|entry| self.score_entry(entry, &normalized, fuzzy))
            .collect();

        ScoreTable {
            conversation_scores,
            math_hit: corpus.find_math_token(&normalized),
        }
    }

    fn score_entry<'a>(
        &self,
        entry: &'a ConversationalEntry,
        normalized: &str,
        fuzzy: bool,
    ) -> CandidateScore<'a> {
        if entry.phrasings().any(|phrasing| phrasing == normalized) {
            return CandidateScore {
                entry,
                score: 1.0,
                exact: true,
            };
        }
        if !fuzzy {
            return CandidateScore {
                entry,
                score: 0.0,
                exact: false,
            };
        }

        let best = entry
            .phrasings()
            .map(|phrasing| self.metric.score(normalized, phrasing))
            .fold(0.0_f64, f64::max)
            .clamp(0.0, 1.0);

        CandidateScore {
            entry,
            score: best,
            exact: false,
        }
    }
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::new(MetricKind::default())
    }
}

impl std::fmt::Debug for CandidateScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateScorer")
            .field("metric", &self.metric.name())
            .field("fuzzy_limit", &self.fuzzy_limit)
            .finish()
    }
}
