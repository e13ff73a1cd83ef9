//! File-by-file ETL into the star schema
//!
//! The [`PipelineDriver`] locates every file under a source directory, then
//! for each one opens a transaction, extracts, derives and loads its records,
//! and commits. A failed file is rolled back; [`FailurePolicy`] decides
//! whether the run stops there or moves on.
//!
//! # Example
//!
//! ```ignore
//! let mut warehouse = DuckDbWarehouse::open(Path::new("sparkify.duckdb"))?;
//! let mut driver = PipelineDriver::new(&mut warehouse, StatementCatalog::for_dialect(Dialect::DuckDb));
//! let reports = driver.run_all(&songs, &logs, &mut StdoutProgress)?;
//! ```

mod driver;
mod error;
mod progress;
mod report;

pub use driver::{DriverState, PipelineDriver};
pub use error::{PipelineError, PipelineResult};
pub use progress::{NoProgress, ProgressSink, RecordingProgress, StdoutProgress};
pub use report::{FailedFile, RunReport};

use serde::{Deserialize, Serialize};

/// What happens when a file fails to extract or load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run with the error; earlier files stay committed
    #[default]
    Halt,
    /// Roll back the file, record it in the report, and go on
    Continue,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "halt" => Ok(FailurePolicy::Halt),
            "continue" => Ok(FailurePolicy::Continue),
            _ => Err(format!("unknown failure policy '{s}'. Valid: halt, continue")),
        }
    }
}
