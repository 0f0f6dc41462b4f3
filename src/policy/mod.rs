//! Resolution policy: reduce a score table to exactly one outcome.
//!
//! Precedence, evaluated in order:
//!
//! 1. A score of `1.0` (literal phrasing match) wins immediately, even when
//!    the message also contains a math token.
//! 2. A math token with no conversational score at or above the threshold
//!    resolves to [`Resolution::MathPattern`].
//! 3. The best conversational score at or above the threshold resolves to
//!    [`Resolution::Conversation`]. Ties go to the entry loaded first.
//! 4. A math token still present resolves to [`Resolution::MathPattern`].
//! 5. Otherwise [`Resolution::NoMatch`].

use serde::{Deserialize, Serialize};

use crate::corpus::ConversationalEntry;
use crate::scorer::{CandidateScore, ScoreTable};

/// Default minimum similarity for a conversational match.
pub const DEFAULT_CONVERSATION_THRESHOLD: f64 = 0.6;

/// Outcome of resolving one message.
///
/// Borrows from the corpus; never copies entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// A stored conversational entry matched.
    Conversation {
        entry: &'a ConversationalEntry,
        score: f64,
    },
    /// The message looks like arithmetic.
    MathPattern {
        category: &'a str,
        matched_token: &'a str,
    },
    /// Nothing matched.
    NoMatch,
}

impl Resolution<'_> {
    /// Short outcome label used in logs and batch output.
    pub fn kind(&self) -> ResolutionKind {
        match self {
            Resolution::Conversation { .. } => ResolutionKind::Conversation,
            Resolution::MathPattern { .. } => ResolutionKind::MathPattern,
            Resolution::NoMatch => ResolutionKind::NoMatch,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, Resolution::NoMatch)
    }
}

/// Outcome tag without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    Conversation,
    MathPattern,
    NoMatch,
}

/// Threshold-based decision rules.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionPolicy {
    conversation_threshold: f64,
}

impl ResolutionPolicy {
    /// Create a policy. Thresholds are clamped to `(0.0, 1.0]`; a
    /// non-finite value falls back to the default.
    pub fn new(conversation_threshold: f64) -> Self {
        let conversation_threshold = if conversation_threshold.is_finite() {
            conversation_threshold.clamp(f64::EPSILON, 1.0)
        } else {
            DEFAULT_CONVERSATION_THRESHOLD
        };
        Self {
            conversation_threshold,
        }
    }

    pub fn conversation_threshold(&self) -> f64 {
        self.conversation_threshold
    }

    /// Pick one outcome from a score table.
    pub fn resolve<'a>(&self, table: &ScoreTable<'a>) -> Resolution<'a> {
        if let Some(exact) = table
            .conversation_scores
            .iter()
            .find(|candidate| candidate.exact || candidate.score >= 1.0)
        {
            return Resolution::Conversation {
                entry: exact.entry,
                score: 1.0,
            };
        }

        let best = best_candidate(&table.conversation_scores)
            .filter(|candidate| candidate.score >= self.conversation_threshold);

        match (best, table.math_hit) {
            (None, Some(hit)) => Resolution::MathPattern {
                category: hit.category,
                matched_token: hit.token,
            },
            (Some(candidate), _) => Resolution::Conversation {
                entry: candidate.entry,
                score: candidate.score,
            },
            (None, None) => Resolution::NoMatch,
        }
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERSATION_THRESHOLD)
    }
}

/// Highest score; the earliest entry wins ties.
fn best_candidate<'s, 'a>(scores: &'s [CandidateScore<'a>]) -> Option<&'s CandidateScore<'a>> {
    let mut best: Option<&'s CandidateScore<'a>> = None;
    for candidate in scores {
        if best.map_or(true, |current| candidate.score > current.score) {
            best = Some(candidate);
        }
    }
    best
}
