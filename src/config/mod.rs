//! Configuration for MathChat.
//!
//! Configuration is read from `~/.mathchat/config.json` (JSON5 syntax is
//! accepted, so comments and trailing commas are fine) and then overridden
//! by `MATHCHAT_*` environment variables.
//!
//! ```json
//! {
//!     // Path to the training-data JSON; the built-in corpus is used when unset.
//!     "knowledge_base": "/home/me/.mathchat/knowledge_base.json",
//!     "engine": {
//!         "conversation_threshold": 0.6,
//!         "metric": "bigram",
//!         "mood": "friendly",
//!         "time_suffix": false
//!     },
//!     "batch": { "concurrency": 4, "output_format": "jsonl" }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::batch::{BatchConfig, BatchOutputFormat};
use crate::error::{MathChatError, Result};
use crate::policy::DEFAULT_CONVERSATION_THRESHOLD;
use crate::similarity::MetricKind;

const CONFIG_DIR: &str = ".mathchat";
const CONFIG_FILE: &str = "config.json";
const ENV_PREFIX: &str = "MATHCHAT_";

/// Engine tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum similarity for a conversational match, in `(0.0, 1.0]`.
    pub conversation_threshold: f64,
    /// Metric gating the threshold.
    pub metric: MetricKind,
    /// Personality mood used to decorate replies.
    pub mood: String,
    /// Append a time-of-day emoji to chat replies.
    pub time_suffix: bool,
    /// Messages longer than this (in chars) skip fuzzy scoring; literal
    /// matches and math tokens are still checked.
    pub max_input_chars: usize,
    /// Largest accepted number of conversational entries.
    pub max_entries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conversation_threshold: DEFAULT_CONVERSATION_THRESHOLD,
            metric: MetricKind::default(),
            mood: "friendly".to_string(),
            time_suffix: false,
            max_input_chars: 2000,
            max_entries: 10_000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Knowledge base file; `None` selects the built-in corpus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_base: Option<PathBuf>,
    pub engine: EngineConfig,
    pub batch: BatchConfig,
}

impl Config {
    /// Directory holding MathChat's config (`~/.mathchat`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
    }

    /// Default config file path.
    pub fn path() -> PathBuf {
        Self::dir().join(CONFIG_FILE)
    }

    /// Load from the default path, apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Load from `path` (missing file means defaults), apply environment
    /// overrides and validate.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content).map_err(|e| {
                MathChatError::Config(format!("{}: {}", path.display(), e))
            })?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse config text (JSON or JSON5).
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        json5::from_str(content).map_err(|e| MathChatError::Config(e.to_string()))
    }

    /// Apply `MATHCHAT_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Values that fail to parse
    /// are logged and ignored.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, suffix))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(path) = get("KNOWLEDGE_BASE") {
            self.knowledge_base = Some(PathBuf::from(path));
        }
        if let Some(raw) = get("ENGINE_CONVERSATION_THRESHOLD") {
            match raw.parse::<f64>() {
                Ok(value) => self.engine.conversation_threshold = value,
                Err(_) => warn!(value = %raw, "Ignoring invalid MATHCHAT_ENGINE_CONVERSATION_THRESHOLD"),
            }
        }
        if let Some(raw) = get("ENGINE_METRIC") {
            match raw.parse::<MetricKind>() {
                Ok(metric) => self.engine.metric = metric,
                Err(e) => warn!(error = %e, "Ignoring invalid MATHCHAT_ENGINE_METRIC"),
            }
        }
        if let Some(mood) = get("ENGINE_MOOD") {
            self.engine.mood = mood;
        }
        if let Some(raw) = get("ENGINE_TIME_SUFFIX") {
            match parse_bool(&raw) {
                Some(value) => self.engine.time_suffix = value,
                None => warn!(value = %raw, "Ignoring invalid MATHCHAT_ENGINE_TIME_SUFFIX"),
            }
        }
        if let Some(raw) = get("BATCH_CONCURRENCY") {
            match raw.parse::<usize>() {
                Ok(value) => self.batch.concurrency = value,
                Err(_) => warn!(value = %raw, "Ignoring invalid MATHCHAT_BATCH_CONCURRENCY"),
            }
        }
        if let Some(raw) = get("BATCH_OUTPUT_FORMAT") {
            match raw.to_ascii_lowercase().as_str() {
                "text" => self.batch.output_format = BatchOutputFormat::Text,
                "jsonl" => self.batch.output_format = BatchOutputFormat::Jsonl,
                _ => warn!(value = %raw, "Ignoring invalid MATHCHAT_BATCH_OUTPUT_FORMAT"),
            }
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.engine.conversation_threshold;
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
            return Err(MathChatError::Config(format!(
                "engine.conversation_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if self.engine.max_input_chars == 0 {
            return Err(MathChatError::Config(
                "engine.max_input_chars must be at least 1".to_string(),
            ));
        }
        if self.engine.max_entries == 0 {
            return Err(MathChatError::Config(
                "engine.max_entries must be at least 1".to_string(),
            ));
        }
        if self.batch.concurrency == 0 {
            return Err(MathChatError::Config(
                "batch.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
