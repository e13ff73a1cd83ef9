//! Error types for pipeline runs
//!
//! Errors carry the file they happened in so the CLI can point at it.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::IngestError;
use crate::warehouse::LoadError;

/// Errors that end a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Discovery or extraction failed
    #[error("Failed to read {path}")]
    Ingest {
        path: PathBuf,
        #[source]
        source: IngestError,
    },

    /// A statement failed while loading a file
    #[error("Failed to load {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn ingest(path: impl Into<PathBuf>, source: IngestError) -> Self {
        Self::Ingest {
            path: path.into(),
            source,
        }
    }

    pub fn load(path: impl Into<PathBuf>, source: LoadError) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }

    /// File or directory the error is attributed to
    pub fn path(&self) -> Option<&Path> {
        match self {
            PipelineError::Ingest { path, .. } | PipelineError::Load { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether the input file itself is malformed
    pub fn is_parse_error(&self) -> bool {
        matches!(self, PipelineError::Ingest { source, .. } if source.is_parse_error())
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Ingest { source, .. } => source.user_message(),
            PipelineError::Load { path, source } => {
                format!("While loading {}:\n{}", path.display(), source.user_message())
            }
            PipelineError::Config(err) => err.user_message(),
            PipelineError::Io(_) => self.to_string(),
        }
    }
}
