//! Batch resolution of many messages from a file.
//!
//! Messages come from plain text, JSONL, a JSON array, or a knowledge base
//! whose phrasings are replayed. They are resolved concurrently against a
//! shared [`IntentEngine`] and reported as text or JSONL.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::corpus::KnowledgeBase;
use crate::engine::{Decision, DecisionKind, IntentEngine};
use crate::error::{MathChatError, Result};
use crate::solver::{self, Solution};

/// Configuration for batch processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of messages resolved concurrently (1 = sequential).
    pub concurrency: usize,
    /// Output format for batch results.
    pub output_format: BatchOutputFormat,
    /// Try the quick arithmetic solver on math decisions.
    pub solve: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            output_format: BatchOutputFormat::default(),
            solve: true,
        }
    }
}

/// Output format for batch results.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchOutputFormat {
    /// Plain text output, each result separated by a blank line.
    #[default]
    Text,
    /// Each result as a JSON object per line.
    Jsonl,
}

/// Result of resolving a single message in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Zero-based index of the message in the batch.
    pub index: usize,
    /// The original message text.
    pub message: String,
    /// The engine's decision, if resolution completed.
    pub decision: Option<Decision>,
    /// Quick arithmetic answer for math decisions, when one could be computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Solution>,
    /// The error message, if the worker failed.
    pub error: Option<String>,
    /// Time taken to resolve this message, in microseconds.
    pub duration_us: u64,
}

/// One message entry in a JSON or JSONL batch file.
#[derive(Deserialize)]
#[serde(untagged)]
enum MessageLine {
    Text(String),
    Object { message: String },
}

impl MessageLine {
    fn into_message(self) -> Option<String> {
        let raw = match self {
            MessageLine::Text(text) => text,
            MessageLine::Object { message } => message,
        };
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Whole-document `.json` batch file.
#[derive(Deserialize)]
#[serde(untagged)]
enum MessageDocument {
    List(Vec<serde_json::Value>),
    Corpus(KnowledgeBase),
}

/// Load the messages to resolve from `path`.
///
/// The format follows the extension:
///
/// - `.jsonl`: one entry per line, either `"text"` or `{"message": "text"}`.
///   Lines that are neither are skipped.
/// - `.json`: either an array of such entries, or a knowledge base whose
///   canonical inputs and variations are replayed in load order. Replaying a
///   corpus shows which phrasings still resolve to their own entry.
/// - anything else: one message per line.
///
/// Blank messages are dropped, and in the line-based formats so are lines
/// starting with `#`. A file that yields nothing is a `Config` error.
pub fn load_messages(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(MathChatError::NotFound(format!(
            "Batch file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let messages = match extension.as_deref() {
        Some("json") => document_messages(serde_json::from_str(&content)?),
        Some("jsonl") => content_lines(&content)
            .filter_map(|line| serde_json::from_str::<MessageLine>(line).ok())
            .filter_map(MessageLine::into_message)
            .collect(),
        _ => content_lines(&content).map(str::to_string).collect(),
    };

    if messages.is_empty() {
        return Err(MathChatError::Config(format!(
            "{} contains no valid messages",
            path.display()
        )));
    }
    debug!(count = messages.len(), path = %path.display(), "Loaded batch messages");
    Ok(messages)
}

fn content_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn document_messages(document: MessageDocument) -> Vec<String> {
    match document {
        MessageDocument::List(values) => values
            .into_iter()
            .filter_map(|value| serde_json::from_value::<MessageLine>(value).ok())
            .filter_map(MessageLine::into_message)
            .collect(),
        MessageDocument::Corpus(kb) => kb
            .conversations
            .iter()
            .flat_map(|entry| entry.phrasings())
            .filter_map(|phrasing| MessageLine::Text(phrasing.to_string()).into_message())
            .collect(),
    }
}

/// Resolve every message against `engine`, at most `config.concurrency` at a
/// time. Results come back in input order.
pub async fn run_batch(
    engine: Arc<IntentEngine>,
    messages: Vec<String>,
    config: &BatchConfig,
) -> Vec<BatchResult> {
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let solve = config.solve;
    let mut handles = Vec::with_capacity(messages.len());

    for (index, message) in messages.into_iter().enumerate() {
        let engine = Arc::clone(&engine);
        let semaphore = Arc::clone(&semaphore);
        let fallback_message = message.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            tokio::task::spawn_blocking(move || resolve_one(&engine, index, message, solve)).await
        });
        handles.push((index, fallback_message, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (index, message, handle) in handles {
        let result = match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) | Err(e) => {
                tracing::warn!(index, error = %e, "Batch worker failed");
                BatchResult {
                    index,
                    message,
                    decision: None,
                    solution: None,
                    error: Some(e.to_string()),
                    duration_us: 0,
                }
            }
        };
        results.push(result);
    }

    results
}

fn resolve_one(engine: &IntentEngine, index: usize, message: String, solve: bool) -> BatchResult {
    let started = Instant::now();
    let decision = engine.respond(&message, &mut rand::rng());
    let solution = if solve {
        decision
            .category
            .as_deref()
            .and_then(|category| solver::solve(&message, category))
    } else {
        None
    };

    BatchResult {
        index,
        message,
        decision: Some(decision),
        solution,
        error: None,
        duration_us: started.elapsed().as_micros() as u64,
    }
}

/// Format batch results into a string according to the specified output format.
///
/// - **Text**: Human-readable blocks separated by blank lines.
/// - **Jsonl**: One JSON object per line, suitable for machine consumption.
pub fn format_results(results: &[BatchResult], format: &BatchOutputFormat) -> String {
    match format {
        BatchOutputFormat::Text => format_results_text(results),
        BatchOutputFormat::Jsonl => format_results_jsonl(results),
    }
}

fn format_results_text(results: &[BatchResult]) -> String {
    let mut output = String::new();
    for result in results {
        // Writing into a String cannot fail.
        let _ = writeln!(output, "[{}] {}", result.index, result.message);
        match (&result.error, &result.decision) {
            (Some(error), _) => {
                let _ = writeln!(output, "    error: {}", error);
            }
            (None, Some(decision)) => {
                let kind = match decision.kind {
                    DecisionKind::Chat => "chat",
                    DecisionKind::Math => "math",
                    DecisionKind::Fallback => "fallback",
                };
                let _ = writeln!(
                    output,
                    "    {} {}%: {}",
                    kind, decision.confidence, decision.text
                );
                if let Some(solution) = &result.solution {
                    let _ = writeln!(
                        output,
                        "    {} = {}",
                        solution.expression,
                        solution.display_answer()
                    );
                }
            }
            (None, None) => {}
        }
    }
    output
}

fn format_results_jsonl(results: &[BatchResult]) -> String {
    results
        .iter()
        .filter_map(|r| serde_json::to_string(r).ok())
        .collect::<Vec<_>>()
        .join("\n")
}
