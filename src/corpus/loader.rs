//! Knowledge base loading.
//!
//! Reads the training-data JSON layout:
//!
//! ```json
//! {
//!     "conversations": [
//!         { "input": "thanks", "variations": ["thx"], "responses": ["No problem!"] }
//!     ],
//!     "math_patterns": { "plus": ["+", "plus"] },
//!     "personalities": { "friendly": { "prefixes": ["Hey!"], "suffixes": ["😊"] } }
//! }
//! ```
//!
//! Loading only parses; structural validation happens when the
//! [`CorpusIndex`](super::CorpusIndex) is built.

use std::path::Path;

use crate::error::{MathChatError, Result};

use super::types::KnowledgeBase;

const BUILTIN_KNOWLEDGE_BASE: &str = include_str!("../../data/knowledge_base.json");

/// Read and parse a knowledge base file.
pub fn load_knowledge_base(path: &Path) -> Result<KnowledgeBase> {
    if !path.exists() {
        return Err(MathChatError::NotFound(format!(
            "Knowledge base not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let kb = parse_knowledge_base(&content)?;

    tracing::debug!(
        path = %path.display(),
        conversations = kb.conversations.len(),
        "Knowledge base loaded"
    );

    Ok(kb)
}

/// Parse a knowledge base from JSON text.
pub fn parse_knowledge_base(content: &str) -> Result<KnowledgeBase> {
    if content.trim().is_empty() {
        return Err(MathChatError::Load("knowledge base is empty".to_string()));
    }
    Ok(serde_json::from_str(content)?)
}

/// The knowledge base shipped with the binary.
pub fn builtin_knowledge_base() -> Result<KnowledgeBase> {
    parse_knowledge_base(BUILTIN_KNOWLEDGE_BASE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusIndex;
    use std::fs;

    #[test]
    fn test_builtin_knowledge_base_is_valid() {
        let kb = builtin_knowledge_base().unwrap();
        assert!(!kb.conversations.is_empty());
        assert!(kb.math_patterns.get("plus").is_some());
        assert!(kb.personalities.as_ref().unwrap().mood("friendly").is_some());
        assert!(CorpusIndex::from_knowledge_base(kb).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(
            &path,
            r#"{"conversations": [{"input": "thanks", "variations": ["thx"], "responses": ["No problem!"]}],
                "math_patterns": {"plus": ["+"]}}"#,
        )
        .unwrap();

        let kb = load_knowledge_base(&path).unwrap();
        assert_eq!(kb.conversations[0].variations, vec!["thx"]);
        assert_eq!(kb.math_patterns.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_knowledge_base(Path::new("/nonexistent/mathchat/kb.json")).unwrap_err();
        assert!(matches!(err, MathChatError::NotFound(_)));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_knowledge_base("{\"conversations\": [").unwrap_err();
        assert!(matches!(err, MathChatError::Json(_)));
    }

    #[test]
    fn test_parse_empty_content() {
        let err = parse_knowledge_base("   ").unwrap_err();
        assert!(matches!(err, MathChatError::Load(_)));
    }

    #[test]
    fn test_parse_then_index_surfaces_missing_responses() {
        let kb = parse_knowledge_base(r#"{"conversations": [{"input": "hi"}]}"#).unwrap();
        let err = CorpusIndex::from_knowledge_base(kb).unwrap_err();
        assert!(matches!(err, MathChatError::Load(_)));
    }
}
