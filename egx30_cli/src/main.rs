mod commands;
mod output;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use egx30_lib::{Pipeline, PipelineConfig};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "egx30")]
#[command(about = "Daily EGX30 close pipeline: extract prices, validate, and load into Hive")]
struct Cli {
    /// Pipeline configuration (TOML). Defaults to the built-in configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, default_value = "text", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest close for every configured symbol
    Extract(commands::extract::ExtractArgs),
    /// Drop malformed rows and duplicate symbols from an extraction batch
    Validate(commands::validate::ValidateArgs),
    /// Write the Hive load script for a clean dataset
    Generate(commands::generate::GenerateArgs),
    /// Execute a load script with the configured warehouse engine
    Load(commands::load::LoadArgs),
    /// Run extract, validate and generate in order, retrying whole runs
    Run(commands::run::RunArgs),
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::embedded()?,
    };
    Ok(config.with_overrides(|key| std::env::var(key).ok())?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("egx30=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Text,
    };

    let config = load_config(cli.config.as_deref())?;
    let pipeline = Pipeline::new(config)?;

    match &cli.command {
        Commands::Extract(args) => commands::extract::run(args, &pipeline, &format).await?,
        Commands::Validate(args) => commands::validate::run(args, &pipeline, &format)?,
        Commands::Generate(args) => commands::generate::run(args, &pipeline, &format)?,
        Commands::Load(args) => commands::load::run(args, &pipeline).await?,
        Commands::Run(args) => commands::run::run(args, &pipeline, &format).await?,
    }

    Ok(())
}
