//! The `run` subcommand: the full pipeline for one run date.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use egx30_lib::Pipeline;

use crate::output::{print_json, print_run_summary, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Run date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Execute the generated load script with the warehouse engine
    #[arg(long)]
    pub execute: bool,
}

pub async fn run(args: &RunArgs, pipeline: &Pipeline, format: &OutputFormat) -> Result<()> {
    let run_date = super::resolve_date(args.date);
    let schedule = &pipeline.config().schedule;
    eprintln!(
        "Starting run for {} (owner {}, up to {} retries)",
        run_date, schedule.owner, schedule.retries
    );

    let summary = pipeline.run(run_date, args.execute).await?;

    match format {
        OutputFormat::Text => print_run_summary(&summary),
        OutputFormat::Json => print_json(&summary),
    }

    Ok(())
}
