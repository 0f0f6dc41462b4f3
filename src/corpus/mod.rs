//! Immutable corpus index built once from a knowledge base.
//!
//! Building the index validates the knowledge base, normalizes every matching
//! key (canonical inputs, variations, math tokens) and compiles the math
//! tokens into a single case-insensitive automaton. After construction the
//! index is never mutated, so it can be shared across threads without locks.

pub mod loader;
pub mod types;

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::{info, warn};

use crate::error::{MathChatError, Result};
use crate::similarity::normalize;

pub use loader::{builtin_knowledge_base, load_knowledge_base, parse_knowledge_base};
pub use types::{
    ConversationalEntry, KnowledgeBase, MathCategory, MathPatternSet, Mood, PersonalityProfile,
};

/// A math-indicator token found in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathHit<'a> {
    /// Operator category the token belongs to.
    pub category: &'a str,
    /// The token as stored in the corpus (lower-cased).
    pub token: &'a str,
}

/// Read-only view over validated conversational entries, math patterns and
/// personality profiles.
#[derive(Debug)]
pub struct CorpusIndex {
    entries: Vec<ConversationalEntry>,
    math_patterns: MathPatternSet,
    personalities: Option<PersonalityProfile>,
    matcher: Option<AhoCorasick>,
    /// Automaton pattern id -> (category index, token index).
    token_slots: Vec<(usize, usize)>,
}

impl CorpusIndex {
    /// Validate and index a knowledge base.
    pub fn from_knowledge_base(kb: KnowledgeBase) -> Result<Self> {
        Self::build(kb, None)
    }

    /// Like [`from_knowledge_base`](Self::from_knowledge_base), rejecting
    /// knowledge bases with more than `max_entries` conversational entries.
    pub fn with_entry_limit(kb: KnowledgeBase, max_entries: usize) -> Result<Self> {
        Self::build(kb, Some(max_entries))
    }

    fn build(kb: KnowledgeBase, max_entries: Option<usize>) -> Result<Self> {
        let KnowledgeBase {
            conversations,
            mut math_patterns,
            personalities,
        } = kb;

        if let Some(limit) = max_entries {
            if conversations.len() > limit {
                return Err(MathChatError::Load(format!(
                    "knowledge base has {} conversational entries (limit {})",
                    conversations.len(),
                    limit
                )));
            }
        }

        let entries = conversations
            .into_iter()
            .enumerate()
            .map(|(index, entry)| normalize_entry(index, entry))
            .collect::<Result<Vec<_>>>()?;

        for category in math_patterns.categories_mut() {
            if category.name.trim().is_empty() {
                return Err(MathChatError::Load(
                    "math pattern category name cannot be empty".to_string(),
                ));
            }
            if category.tokens.is_empty() {
                return Err(MathChatError::Load(format!(
                    "math pattern category '{}' has no tokens",
                    category.name
                )));
            }
            for token in category.tokens.iter_mut() {
                if token.trim().is_empty() {
                    return Err(MathChatError::Load(format!(
                        "math pattern category '{}' contains a blank token",
                        category.name
                    )));
                }
                *token = token.to_lowercase();
            }
        }

        let mut token_slots = Vec::with_capacity(math_patterns.token_count());
        let mut tokens: Vec<&str> = Vec::with_capacity(math_patterns.token_count());
        for (ci, category) in math_patterns.categories().iter().enumerate() {
            for (ti, token) in category.tokens.iter().enumerate() {
                token_slots.push((ci, ti));
                tokens.push(token.as_str());
            }
        }

        let matcher = if tokens.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .ascii_case_insensitive(true)
                    .match_kind(MatchKind::Standard)
                    .build(&tokens)
                    .map_err(|e| {
                        MathChatError::Load(format!("failed to compile math patterns: {}", e))
                    })?,
            )
        };

        let personalities = personalities.filter(|profile| !profile.is_empty());

        info!(
            entries = entries.len(),
            math_categories = math_patterns.len(),
            math_tokens = token_slots.len(),
            personalities = personalities.is_some(),
            "Corpus index built"
        );

        Ok(Self {
            entries,
            math_patterns,
            personalities,
            matcher,
            token_slots,
        })
    }

    /// Conversational entries in load order.
    pub fn all_entries(&self) -> &[ConversationalEntry] {
        &self.entries
    }

    pub fn math_patterns(&self) -> &MathPatternSet {
        &self.math_patterns
    }

    pub fn personalities(&self) -> Option<&PersonalityProfile> {
        self.personalities.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First math token contained in `normalized`, by declaration order
    /// (category first, then token), regardless of where it occurs in the text.
    pub fn find_math_token(&self, normalized: &str) -> Option<MathHit<'_>> {
        let matcher = self.matcher.as_ref()?;
        let first = matcher
            .find_overlapping_iter(normalized)
            .map(|m| m.pattern().as_usize())
            .min()?;
        let (ci, ti) = self.token_slots[first];
        let category = &self.math_patterns.categories()[ci];
        Some(MathHit {
            category: &category.name,
            token: &category.tokens[ti],
        })
    }
}

fn normalize_entry(index: usize, entry: ConversationalEntry) -> Result<ConversationalEntry> {
    let input = normalize(&entry.input);
    if input.is_empty() {
        return Err(MathChatError::Load(format!(
            "conversation entry {} has an empty input",
            index
        )));
    }
    if entry.responses.is_empty() {
        return Err(MathChatError::Load(format!(
            "conversation entry {} ('{}') has no responses",
            index, input
        )));
    }

    let mut variations = Vec::with_capacity(entry.variations.len());
    for variation in &entry.variations {
        let normalized = normalize(variation);
        if normalized.is_empty() {
            warn!(entry = index, "Dropping blank variation");
            continue;
        }
        variations.push(normalized);
    }

    Ok(ConversationalEntry {
        input,
        variations,
        responses: entry.responses,
    })
}
