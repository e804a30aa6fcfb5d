//! The `extract` subcommand: fetch closes and write the extraction batch.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use egx30_lib::Pipeline;

use crate::output::{print_extraction, print_json, OutputFormat};

#[derive(Args)]
pub struct ExtractArgs {
    /// Run date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub async fn run(args: &ExtractArgs, pipeline: &Pipeline, format: &OutputFormat) -> Result<()> {
    let run_date = super::resolve_date(args.date);
    let artifact = pipeline.extract(run_date).await?;

    match format {
        OutputFormat::Text => print_extraction(&artifact),
        OutputFormat::Json => print_json(&artifact),
    }

    Ok(())
}
