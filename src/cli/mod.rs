//! Plumbing shared by the `etl`, `warehouse-etl` and `create-tables` binaries

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::config::{ConfigError, EtlConfig};
use crate::ingest::IngestError;
use crate::pipeline::PipelineError;
use crate::staging::StagingError;
use crate::warehouse::LoadError;

/// Arguments accepted by every binary
#[derive(Debug, Parser)]
pub struct CommonArgs {
    /// Configuration file (defaults to ./etl.toml when present)
    #[arg(long, env = "SONGPLAY_ETL_CONFIG")]
    pub config: Option<PathBuf>,
}

impl CommonArgs {
    pub fn load_config(&self) -> Result<EtlConfig, ConfigError> {
        EtlConfig::discover(self.config.as_deref())
    }
}

/// Render an error with the hint of the most specific known error type
pub fn user_message(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<PipelineError>() {
        e.user_message()
    } else if let Some(e) = err.downcast_ref::<StagingError>() {
        e.user_message()
    } else if let Some(e) = err.downcast_ref::<LoadError>() {
        e.user_message()
    } else if let Some(e) = err.downcast_ref::<ConfigError>() {
        e.user_message()
    } else if let Some(e) = err.downcast_ref::<IngestError>() {
        e.user_message()
    } else {
        format!("{err:#}")
    }
}

/// Set up logging, run the body, and map the outcome to an exit code
pub fn main_with<F>(body: F) -> ExitCode
where
    F: FnOnce() -> anyhow::Result<()>,
{
    if let Err(e) = crate::logging::init(crate::logging::DEFAULT_FILTER) {
        eprintln!("{e}");
    }

    match body() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Run failed");
            eprintln!("Error: {}", user_message(&err));
            ExitCode::FAILURE
        }
    }
}
