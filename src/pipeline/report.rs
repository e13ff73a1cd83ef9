//! Run summaries

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ingest::SourceKind;

/// A file rolled back and skipped under [`super::FailurePolicy::Continue`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of running one source directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub source: SourceKind,
    pub root: PathBuf,
    pub files_found: usize,
    /// Files whose transaction committed
    pub files_processed: usize,
    /// Rows the loader reported written in committed files; inserts
    /// ignored on a duplicate key count zero
    pub rows_written: usize,
    pub failed_files: Vec<FailedFile>,
    pub duration_ms: u64,
}

impl RunReport {
    /// Whether every discovered file committed
    pub fn is_complete(&self) -> bool {
        self.failed_files.is_empty() && self.files_processed == self.files_found
    }

    /// One-line summary for logs and CLI output
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} files, {} rows in {}ms",
            self.source,
            self.files_processed,
            self.files_found,
            self.rows_written,
            self.duration_ms
        );
        if !self.failed_files.is_empty() {
            line.push_str(&format!(", {} failed", self.failed_files.len()));
        }
        line
    }
}
