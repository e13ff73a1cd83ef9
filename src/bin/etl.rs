//! Load song files, then event logs, into the star schema one file at a time

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use songplay_etl::cli::{self, CommonArgs};
use songplay_etl::pipeline::{PipelineDriver, StdoutProgress};
use songplay_etl::warehouse::{self, StatementCatalog};

fn main() -> ExitCode {
    let args = CommonArgs::parse();
    cli::main_with(|| run(&args))
}

fn run(args: &CommonArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let mut warehouse = warehouse::open(&config.database)
        .with_context(|| format!("opening {} warehouse", config.database.backend))?;
    let catalog = StatementCatalog::for_dialect(warehouse.dialect());

    let mut driver = PipelineDriver::new(warehouse.as_mut(), catalog)
        .with_policy(config.pipeline.on_error)
        .with_extension(config.data.extension.clone());
    let reports = driver.run_all(
        &config.data.song_data,
        &config.data.log_data,
        &mut StdoutProgress,
    )?;

    for report in &reports {
        for failed in &report.failed_files {
            eprintln!("Skipped {}: {}", failed.path.display(), failed.error);
        }
        tracing::info!(summary = %report.summary(), "Done");
    }
    if reports.iter().any(|r| !r.is_complete()) {
        anyhow::bail!("some files failed to load");
    }
    Ok(())
}
