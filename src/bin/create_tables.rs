//! Drop and recreate the staging and star-schema tables

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use songplay_etl::cli::{self, CommonArgs};
use songplay_etl::warehouse::{self, schema};

fn main() -> ExitCode {
    let args = CommonArgs::parse();
    cli::main_with(|| run(&args))
}

fn run(args: &CommonArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let mut warehouse = warehouse::open(&config.database)
        .with_context(|| format!("opening {} warehouse", config.database.backend))?;
    schema::reset(warehouse.as_mut())?;
    println!("{} tables created.", schema::TABLES.len());
    Ok(())
}
