//! The `validate` subcommand: clean and deduplicate an extraction batch.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use egx30_lib::Pipeline;

use crate::output::{print_clean, print_json, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {
    /// Run date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Extraction batch to read. Defaults to the batch for the run date.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub fn run(args: &ValidateArgs, pipeline: &Pipeline, format: &OutputFormat) -> Result<()> {
    let run_date = super::resolve_date(args.date);
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| pipeline.layout().extraction_path(run_date));
    let artifact = pipeline.validate(&input, run_date)?;

    if artifact.kept == 0 {
        eprintln!("Warning: clean dataset for {} is empty", run_date);
    }

    match format {
        OutputFormat::Text => print_clean(&artifact),
        OutputFormat::Json => print_json(&artifact),
    }

    Ok(())
}
