//! CLI command handlers.

pub(crate) mod batch;
pub(crate) mod chat;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use mathchat::config::Config;
use mathchat::corpus::{builtin_knowledge_base, load_knowledge_base, CorpusIndex, KnowledgeBase};
use mathchat::engine::IntentEngine;
use mathchat::similarity::MetricKind;

/// Global flags that override the loaded configuration.
#[derive(Debug, Clone, Default)]
pub(crate) struct EngineArgs {
    pub knowledge_base: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub metric: Option<MetricKind>,
}

/// Load config, then layer CLI flags on top.
pub(crate) fn load_config(args: &EngineArgs) -> Result<Config> {
    let mut config = Config::load().with_context(|| "Failed to load configuration")?;
    if let Some(path) = &args.knowledge_base {
        config.knowledge_base = Some(path.clone());
    }
    if let Some(threshold) = args.threshold {
        config.engine.conversation_threshold = threshold;
    }
    if let Some(metric) = args.metric {
        config.engine.metric = metric;
    }
    config.validate().with_context(|| "Invalid command-line override")?;
    Ok(config)
}

/// Read the configured knowledge base, or the built-in one.
fn read_knowledge_base(config: &Config) -> Result<KnowledgeBase> {
    match &config.knowledge_base {
        Some(path) => load_knowledge_base(path).map_err(|e| anyhow::anyhow!(format_cli_error(&e))),
        None => builtin_knowledge_base().with_context(|| "Built-in knowledge base is invalid"),
    }
}

/// Build the engine once for the lifetime of a command.
pub(crate) fn build_engine(config: &Config) -> Result<IntentEngine> {
    let kb = read_knowledge_base(config)?;
    let corpus = CorpusIndex::with_entry_limit(kb, config.engine.max_entries)
        .map_err(|e| anyhow::anyhow!(format_cli_error(&e)))?;
    let engine = IntentEngine::new(corpus, &config.engine);
    info!(
        entries = engine.corpus().len(),
        metric = engine.metric_name(),
        threshold = engine.policy().conversation_threshold(),
        "Engine ready"
    );
    Ok(engine)
}

/// Validate a knowledge base and print a summary.
pub(crate) fn cmd_check(args: &EngineArgs, path: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(args)?;
    if path.is_some() {
        config.knowledge_base = path;
    }

    let source = config
        .knowledge_base
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("[FAIL] {}", source);
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    let corpus = engine.corpus();
    let patterns = corpus.math_patterns();
    println!("[OK] {}", source);
    println!("  Conversations:    {}", corpus.len());
    println!(
        "  Phrasings:        {}",
        corpus
            .all_entries()
            .iter()
            .map(|e| e.phrasings().count())
            .sum::<usize>()
    );
    println!(
        "  Math categories:  {} ({} tokens)",
        patterns.len(),
        patterns.token_count()
    );
    match corpus.personalities() {
        Some(profile) => {
            let moods: Vec<&str> = profile.mood_names().collect();
            println!("  Moods:            {}", moods.join(", "));
            if profile.mood(&config.engine.mood).is_none() {
                println!(
                    "  Warning: configured mood '{}' is not defined; replies stay undecorated",
                    config.engine.mood
                );
            }
        }
        None => println!("  Moods:            none"),
    }
    println!("  Metric:           {}", engine.metric_name());
    println!(
        "  Threshold:        {}",
        engine.policy().conversation_threshold()
    );
    Ok(())
}

/// Add actionable guidance to knowledge-base errors.
pub(crate) fn format_cli_error(e: &dyn std::fmt::Display) -> String {
    let msg = e.to_string();

    if msg.contains("not found") {
        format!(
            "{}\n\n  Fix: Pass --knowledge-base PATH or set MATHCHAT_KNOWLEDGE_BASE.",
            msg
        )
    } else if msg.contains("no responses") {
        format!(
            "{}\n\n  Fix: Every conversation needs at least one response.",
            msg
        )
    } else if msg.contains("(limit") {
        format!(
            "{}\n\n  Fix: Raise engine.max_entries in {}.",
            msg,
            Config::path().display()
        )
    } else {
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cli_error_not_found() {
        let e = anyhow::anyhow!("Knowledge base not found: /tmp/kb.json");
        let msg = format_cli_error(&e);
        assert!(msg.contains("Fix:"));
        assert!(msg.contains("--knowledge-base"));
    }

    #[test]
    fn test_format_cli_error_generic() {
        let e = anyhow::anyhow!("Something went wrong");
        let msg = format_cli_error(&e);
        assert_eq!(msg, "Something went wrong");
    }

    #[test]
    fn test_build_engine_from_builtin() {
        let config = Config::default();
        let engine = build_engine(&config).unwrap();
        assert!(!engine.corpus().is_empty());
        assert_eq!(engine.metric_name(), "bigram");
    }

    #[test]
    fn test_build_engine_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"{"conversations": [{"input": "hi", "responses": ["Hello"]}]}"#,
        )
        .unwrap();
        let config = Config {
            knowledge_base: Some(path),
            ..Config::default()
        };
        let engine = build_engine(&config).unwrap();
        assert_eq!(engine.corpus().len(), 1);
    }

    #[test]
    fn test_build_engine_missing_file() {
        let config = Config {
            knowledge_base: Some(PathBuf::from("/definitely/not/here.json")),
            ..Config::default()
        };
        assert!(build_engine(&config).is_err());
    }
}
