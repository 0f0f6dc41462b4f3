//! Knowledge base type definitions.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// A known conversational utterance and its replies.
///
/// `input` is always considered one of the phrasings, whether or not it is
/// repeated in `variations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationalEntry {
    /// Canonical phrasing.
    pub input: String,
    /// Alternate phrasings (order irrelevant).
    pub variations: Vec<String>,
    /// Candidate replies, chosen uniformly at random.
    pub responses: Vec<String>,
}

impl ConversationalEntry {
    /// Create an entry from borrowed strings.
    pub fn new(input: &str, variations: &[&str], responses: &[&str]) -> Self {
        Self {
            input: input.to_string(),
            variations: variations.iter().map(|v| v.to_string()).collect(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Canonical input followed by every variation.
    pub fn phrasings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.input.as_str()).chain(self.variations.iter().map(String::as_str))
    }
}

/// One operator category and the tokens that signal it in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathCategory {
    /// Category name (e.g. `plus`).
    pub name: String,
    /// Substrings indicating the operator (e.g. `+`, `plus`, `add`).
    pub tokens: Vec<String>,
}

/// Operator categories in declaration order.
///
/// Order matters: when several tokens occur in a message, the category
/// declared first wins. In JSON this is an object whose keys keep document
/// order; a nested object value (the `"operators": {...}` layout) is
/// flattened in place, and values that are neither arrays nor objects are
/// skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MathPatternSet {
    categories: Vec<MathCategory>,
}

impl MathPatternSet {
    /// Empty pattern set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append tokens to a category, creating it at the end if it is new.
    pub fn insert<I, S>(&mut self, name: &str, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens.into_iter().map(Into::into);
        match self.categories.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.tokens.extend(tokens),
            None => self.categories.push(MathCategory {
                name: name.to_string(),
                tokens: tokens.collect(),
            }),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<I, S>(mut self, name: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, tokens);
        self
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> &[MathCategory] {
        &self.categories
    }

    /// Look up a category by name.
    pub fn get(&self, name: &str) -> Option<&MathCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total token count across all categories.
    pub fn token_count(&self) -> usize {
        self.categories.iter().map(|c| c.tokens.len()).sum()
    }

    pub(crate) fn categories_mut(&mut self) -> &mut Vec<MathCategory> {
        &mut self.categories
    }

    fn collect_from_map(
        &mut self,
        map: serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<(), String> {
        for (name, value) in map {
            match value {
                serde_json::Value::Array(items) => {
                    let mut tokens = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            serde_json::Value::String(token) => tokens.push(token),
                            other => {
                                return Err(format!(
                                    "math pattern '{}' has a non-string token: {}",
                                    name, other
                                ))
                            }
                        }
                    }
                    self.insert(&name, tokens);
                }
                serde_json::Value::Object(nested) => self.collect_from_map(nested)?,
                _ => {
                    tracing::warn!(category = %name, "Skipping math pattern that is not a list");
                }
            }
        }
        Ok(())
    }
}

impl Serialize for MathPatternSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.tokens)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MathPatternSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut set = MathPatternSet::new();
        set.collect_from_map(map).map_err(de::Error::custom)?;
        Ok(set)
    }
}

/// Decorations for one mood.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mood {
    /// Text placed before the response.
    pub prefixes: Vec<String>,
    /// Text placed after the response.
    pub suffixes: Vec<String>,
}

/// Mood name to decorations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalityProfile {
    moods: BTreeMap<String, Mood>,
}

impl PersonalityProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style mood registration.
    pub fn with_mood(mut self, name: &str, prefixes: &[&str], suffixes: &[&str]) -> Self {
        self.moods.insert(
            name.to_string(),
            Mood {
                prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
                suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn mood(&self, name: &str) -> Option<&Mood> {
        self.moods.get(name)
    }

    /// Mood names in sorted order.
    pub fn mood_names(&self) -> impl Iterator<Item = &str> {
        self.moods.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.moods.is_empty()
    }
}

/// Everything the engine is built from, in the training-data JSON layout.
///
/// Unknown top-level keys (for example `math_problems`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBase {
    /// Conversational entries in load order.
    pub conversations: Vec<ConversationalEntry>,
    /// Math-indicator tokens by operator category.
    pub math_patterns: MathPatternSet,
    /// Optional response decorations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personalities: Option<PersonalityProfile>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: ConversationalEntry) -> Self {
        self.conversations.push(entry);
        self
    }

    pub fn with_math_patterns(mut self, patterns: MathPatternSet) -> Self {
        self.math_patterns = patterns;
        self
    }

    pub fn with_personalities(mut self, profile: PersonalityProfile) -> Self {
        self.personalities = Some(profile);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrasings_include_canonical_input() {
        let entry = ConversationalEntry::new("thanks", &["thank you", "thx"], &["No problem!"]);
        let phrasings: Vec<&str> = entry.phrasings().collect();
        assert_eq!(phrasings, vec!["thanks", "thank you", "thx"]);
    }

    #[test]
    fn test_math_patterns_keep_document_order() {
        let json = r#"{"times": ["*"], "plus": ["+"], "minus": ["-"]}"#;
        let set: MathPatternSet = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = set.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["times", "plus", "minus"]);
    }

    #[test]
    fn test_math_patterns_flatten_nested_operators() {
        let json = r#"{"operators": {"plus": ["+", "plus"], "minus": ["-"]}, "divide": ["/"]}"#;
        let set: MathPatternSet = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = set.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["plus", "minus", "divide"]);
        assert_eq!(set.get("plus").unwrap().tokens, vec!["+", "plus"]);
    }

    #[test]
    fn test_math_patterns_skip_scalars() {
        let json = r#"{"version": 2, "plus": ["+"]}"#;
        let set: MathPatternSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_math_patterns_reject_non_string_tokens() {
        let json = r#"{"plus": ["+", 7]}"#;
        let err = serde_json::from_str::<MathPatternSet>(json).unwrap_err();
        assert!(err.to_string().contains("non-string token"));
    }

    #[test]
    fn test_math_patterns_insert_merges_category() {
        let mut set = MathPatternSet::new().with("plus", ["+"]);
        set.insert("plus", ["add"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.token_count(), 2);
    }

    #[test]
    fn test_math_patterns_serialize_roundtrip_order() {
        let set = MathPatternSet::new().with("minus", ["-"]).with("plus", ["+"]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"minus":["-"],"plus":["+"]}"#);
    }

    #[test]
    fn test_knowledge_base_defaults_and_unknown_keys() {
        let json = r#"{"conversations": [{"input": "hi", "responses": ["Hey"]}], "math_problems": []}"#;
        let kb: KnowledgeBase = serde_json::from_str(json).unwrap();
        assert_eq!(kb.conversations.len(), 1);
        assert!(kb.conversations[0].variations.is_empty());
        assert!(kb.math_patterns.is_empty());
        assert!(kb.personalities.is_none());
    }

    #[test]
    fn test_personality_profile_deserialize() {
        let json = r#"{"friendly": {"prefixes": ["Hey!"], "suffixes": ["😊"]}, "calm": {}}"#;
        let profile: PersonalityProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.mood("friendly").unwrap().prefixes, vec!["Hey!"]);
        assert!(profile.mood("calm").unwrap().suffixes.is_empty());
        assert_eq!(profile.mood_names().collect::<Vec<_>>(), vec!["calm", "friendly"]);
    }
}
