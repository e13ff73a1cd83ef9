//! File discovery and record extraction
//!
//! Two input families are supported:
//! - song-metadata files, one JSON object per file
//! - event logs, one JSON object per line

mod error;
mod extract;
mod locate;

pub use error::IngestError;
pub use extract::{extract_events, extract_song};
pub use locate::locate;

use serde::{Deserialize, Serialize};

/// Which extractor a directory of files is routed through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Song-metadata files
    Songs,
    /// Event-log files
    Events,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Songs => "songs",
            SourceKind::Events => "events",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
