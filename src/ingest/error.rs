//! Error types for file discovery and record extraction

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating or parsing input files
#[derive(Error, Debug)]
pub enum IngestError {
    /// Source directory missing or unreadable
    #[error("Source not accessible: {path} - {reason}")]
    SourceNotAccessible { path: PathBuf, reason: String },

    /// Glob pattern could not be built
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// JSON parsing error for a specific file
    #[error("JSON parsing error in {path} at line {line}: {error}")]
    JsonParse {
        path: PathBuf,
        line: usize,
        error: String,
    },

    /// A required field is absent or null
    #[error("Missing field '{field}' in {path} at line {line}")]
    MissingField {
        path: PathBuf,
        line: usize,
        field: &'static str,
    },

    /// A field is present but cannot be interpreted
    #[error("Invalid value for '{field}' in {path} at line {line}: {reason}")]
    InvalidValue {
        path: PathBuf,
        line: usize,
        field: &'static str,
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Whether the error describes malformed or incomplete file content
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            IngestError::JsonParse { .. }
                | IngestError::MissingField { .. }
                | IngestError::InvalidValue { .. }
        )
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            IngestError::SourceNotAccessible { path, reason } => {
                format!(
                    "Cannot access source: {}\nReason: {reason}\n\n\
                    Hint: Check the [data] paths in your configuration.",
                    path.display()
                )
            }
            IngestError::JsonParse { path, line, error } => {
                format!(
                    "JSON parse error in {} at line {line}:\n{error}\n\n\
                    Hint: Check the JSON syntax around line {line}.",
                    path.display()
                )
            }
            IngestError::MissingField { path, line, field } => {
                format!(
                    "Missing field '{field}' in {} at line {line}.\n\n\
                    Hint: Every record of this kind must carry '{field}'.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}
