//! Progress lines emitted during a run

use std::io::Write;
use std::path::Path;

/// Receives progress as files are discovered and committed
pub trait ProgressSink {
    /// Called once after discovery
    fn files_found(&mut self, count: usize, root: &Path);

    /// Called after each committed file
    fn file_processed(&mut self, done: usize, total: usize);
}

pub fn found_line(count: usize, root: &Path) -> String {
    format!("{} files found in {}", count, root.display())
}

pub fn processed_line(done: usize, total: usize) -> String {
    format!("{}/{} files processed.", done, total)
}

/// Writes progress lines to standard output
#[derive(Debug, Default)]
pub struct StdoutProgress;

impl StdoutProgress {
    fn emit(line: &str) {
        let mut stdout = std::io::stdout().lock();
        // Ignore broken pipes
        let _ = writeln!(stdout, "{line}");
    }
}

impl ProgressSink for StdoutProgress {
    fn files_found(&mut self, count: usize, root: &Path) {
        Self::emit(&found_line(count, root));
    }

    fn file_processed(&mut self, done: usize, total: usize) {
        Self::emit(&processed_line(done, total));
    }
}

/// Keeps progress lines in memory
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub lines: Vec<String>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for RecordingProgress {
    fn files_found(&mut self, count: usize, root: &Path) {
        self.lines.push(found_line(count, root));
    }

    fn file_processed(&mut self, done: usize, total: usize) {
        self.lines.push(processed_line(done, total));
    }
}

/// Discards progress
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn files_found(&mut self, _count: usize, _root: &Path) {}

    fn file_processed(&mut self, _done: usize, _total: usize) {}
}
