//! Bulk staging load for the warehouse variant
//!
//! Raw files are copied into `staging_events` and `staging_songs`, then the
//! star-schema tables are filled from them with set-based inserts. The step
//! order is declared up front in a [`StagePlan`] and checked before anything
//! runs.

mod error;
mod plan;
mod runner;

pub use error::StagingError;
pub use plan::{Phase, StagePlan, StageStep, StagingSources};
pub use runner::{StagingPipeline, StagingReport, StepOutcome};
