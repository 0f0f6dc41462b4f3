//! Intent resolution engine.
//!
//! [`IntentEngine`] owns the immutable corpus and the configured scorer and
//! policy. It is built once at startup and shared by reference (or `Arc`)
//! with whatever handles messages; it holds no interior mutability, so
//! concurrent calls need no locking.
//!
//! # Example
//!
//! ```rust
//! use mathchat::config::EngineConfig;
//! use mathchat::corpus::{ConversationalEntry, CorpusIndex, KnowledgeBase, MathPatternSet};
//! use mathchat::engine::IntentEngine;
//! use mathchat::policy::Resolution;
//!
//! let kb = KnowledgeBase::new()
//!     .with_entry(ConversationalEntry::new("thanks", &["thx"], &["No problem!"]))
//!     .with_math_patterns(MathPatternSet::new().with("plus", ["+", "plus"]));
//! let engine = IntentEngine::new(CorpusIndex::from_knowledge_base(kb).unwrap(), &EngineConfig::default());
//!
//! assert!(matches!(engine.resolve("thx"), Resolution::Conversation { score, .. } if score == 1.0));
//! assert!(matches!(engine.resolve("5 plus 3"), Resolution::MathPattern { category: "plus", .. }));
//! assert_eq!(engine.resolve(""), Resolution::NoMatch);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::corpus::CorpusIndex;
use crate::policy::{Resolution, ResolutionPolicy};
use crate::responder::{ResponseSelector, TimeOfDay};
use crate::scorer::{CandidateScorer, ScoreTable};

/// Reply used when nothing matched.
pub const NO_MATCH_REPLY: &str =
    "I'm not sure how to respond to that. Would you like to try a math problem?";

/// Confidence reported for math-pattern decisions.
pub const MATH_CONFIDENCE: u8 = 90;
/// Confidence reported when nothing matched.
pub const FALLBACK_CONFIDENCE: u8 = 50;

/// Which path the caller should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    /// Send `text` back as the reply.
    Chat,
    /// Forward `text` (the original message) to an arithmetic solver.
    Math,
    /// Nothing matched; `text` is a generic reply.
    Fallback,
}

/// Decision packet handed back to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub kind: DecisionKind,
    /// 0-100.
    pub confidence: u8,
    /// Reply text for `Chat`/`Fallback`, original message for `Math`.
    pub text: String,
    /// Operator category for `Math`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Token that triggered a `Math` decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_token: Option<String>,
    /// Canonical input of the matched entry for `Chat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_input: Option<String>,
    /// Similarity of the winning entry (0.0 unless `Chat`).
    pub score: f64,
}

/// Long-lived, read-only resolver.
#[derive(Debug)]
pub struct IntentEngine {
    corpus: CorpusIndex,
    scorer: CandidateScorer,
    policy: ResolutionPolicy,
    mood: String,
    time_suffix: bool,
}

impl IntentEngine {
    pub fn new(corpus: CorpusIndex, config: &EngineConfig) -> Self {
        Self {
            corpus,
            scorer: CandidateScorer::new(config.metric).with_fuzzy_limit(config.max_input_chars),
            policy: ResolutionPolicy::new(config.conversation_threshold),
            mood: config.mood.clone(),
            time_suffix: config.time_suffix,
        }
    }

    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    pub fn metric_name(&self) -> &str {
        self.scorer.metric_name()
    }

    /// Score a message without deciding.
    pub fn score(&self, message: &str) -> ScoreTable<'_> {
        self.scorer.score(&self.corpus, message)
    }

    /// Resolve a message to one outcome. Total over all inputs.
    pub fn resolve(&self, message: &str) -> Resolution<'_> {
        let table = self.score(message);
        let resolution = self.policy.resolve(&table);
        match &resolution {
            Resolution::Conversation { entry, score } => {
                debug!(outcome = "conversation", entry = %entry.input, score, "Message resolved")
            }
            Resolution::MathPattern {
                category,
                matched_token,
            } => debug!(outcome = "math_pattern", category, token = matched_token, "Message resolved"),
            Resolution::NoMatch => debug!(outcome = "no_match", "Message resolved"),
        }
        resolution
    }

    /// Resolve and build the decision packet, using the local clock for the
    /// optional time-of-day suffix.
    pub fn respond<R: Rng + ?Sized>(&self, message: &str, rng: &mut R) -> Decision {
        self.respond_at(message, rng, TimeOfDay::now())
    }

    /// Like [`respond`](Self::respond) with an explicit time of day.
    pub fn respond_at<R: Rng + ?Sized>(
        &self,
        message: &str,
        rng: &mut R,
        time_of_day: TimeOfDay,
    ) -> Decision {
        match self.resolve(message) {
            Resolution::Conversation { entry, score } => {
                let selector =
                    ResponseSelector::from_profile(self.corpus.personalities(), &self.mood);
                let mut text = selector.select(entry, rng);
                if self.time_suffix {
                    text.push(' ');
                    text.push_str(time_of_day.emoji());
                }
                Decision {
                    kind: DecisionKind::Chat,
                    confidence: confidence_from_score(score),
                    text,
                    category: None,
                    matched_token: None,
                    matched_input: Some(entry.input.clone()),
                    score,
                }
            }
            Resolution::MathPattern {
                category,
                matched_token,
            } => Decision {
                kind: DecisionKind::Math,
                confidence: MATH_CONFIDENCE,
                text: message.trim().to_string(),
                category: Some(category.to_string()),
                matched_token: Some(matched_token.to_string()),
                matched_input: None,
                score: 0.0,
            },
            Resolution::NoMatch => Decision {
                kind: DecisionKind::Fallback,
                confidence: FALLBACK_CONFIDENCE,
                text: NO_MATCH_REPLY.to_string(),
                category: None,
                matched_token: None,
                matched_input: None,
                score: 0.0,
            },
        }
    }
}

fn confidence_from_score(score: f64) -> u8 {
    (score.clamp(0.0, 1.0) * 100.0).floor() as u8
}
