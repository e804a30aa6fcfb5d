//! The `load` subcommand: hand a load script to the warehouse engine.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use egx30_lib::Pipeline;

#[derive(Args)]
pub struct LoadArgs {
    /// Run date (YYYY-MM-DD) used to locate the script. Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Load script to execute. Defaults to the script for the run date.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Print the engine command line instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: &LoadArgs, pipeline: &Pipeline) -> Result<()> {
    let script = args
        .script
        .clone()
        .unwrap_or_else(|| pipeline.layout().script_path(super::resolve_date(args.date)));

    if args.dry_run {
        println!("{}", pipeline.engine().command_line(&script).join(" "));
        return Ok(());
    }

    pipeline.load(&script).await?;
    eprintln!("Loaded {}", script.display());
    Ok(())
}
