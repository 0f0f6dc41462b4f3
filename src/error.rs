//! Error types for MathChat
//!
//! This module defines all error types used throughout the MathChat crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! Resolution itself never fails: every input string maps to a decision.
//! Errors only come from startup work (config, knowledge base loading) and
//! from the batch file reader.

use thiserror::Error;

/// The primary error type for MathChat operations.
#[derive(Error, Debug)]
pub enum MathChatError {
    /// Configuration-related errors (invalid values, unparsable config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Knowledge base is structurally invalid (missing input, no responses, etc.)
    #[error("Load error: {0}")]
    Load(String),

    /// Resource not found (knowledge base file, batch file, etc.)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for MathChat operations.
pub type Result<T> = std::result::Result<T, MathChatError>;
