//! The `generate` subcommand: write the Hive load script for a clean dataset.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use egx30_lib::Pipeline;

use crate::output::{print_json, print_script, OutputFormat};

#[derive(Args)]
pub struct GenerateArgs {
    /// Run date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Clean dataset to load. Defaults to the dataset for the run date.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub fn run(args: &GenerateArgs, pipeline: &Pipeline, format: &OutputFormat) -> Result<()> {
    let run_date = super::resolve_date(args.date);
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| pipeline.layout().clean_path(run_date));
    let artifact = pipeline.generate(&input, run_date)?;

    match format {
        OutputFormat::Text => print_script(&artifact),
        OutputFormat::Json => print_json(&artifact),
    }

    Ok(())
}
