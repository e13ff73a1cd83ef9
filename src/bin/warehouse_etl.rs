//! Bulk-copy raw files into staging tables, then fill the star schema from them

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use songplay_etl::cli::{self, CommonArgs};
use songplay_etl::staging::{StagePlan, StagingPipeline, StagingSources};
use songplay_etl::warehouse::{self, Dialect};

fn main() -> ExitCode {
    let args = CommonArgs::parse();
    cli::main_with(|| run(&args))
}

fn run(args: &CommonArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let mut warehouse = warehouse::open(&config.database)
        .with_context(|| format!("opening {} warehouse", config.database.backend))?;
    if warehouse.dialect() != Dialect::DuckDb {
        anyhow::bail!(
            "the staging load reads files with DuckDB's read_json; set backend = \"duckdb\""
        );
    }

    let sources = StagingSources {
        log_data: config.data.log_data.clone(),
        song_data: config.data.song_data.clone(),
        extension: config.data.extension.clone(),
    };
    let pipeline = StagingPipeline::new(StagePlan::standard(&sources)?);
    let report = pipeline.run(warehouse.as_mut())?;

    for step in &report.steps {
        println!("{} ({}): {} rows", step.name, step.phase, step.rows);
    }
    Ok(())
}
