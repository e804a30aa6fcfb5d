//! Run orchestration: the three stages in order, whole-run retries.
//!
//! Stages hand off through typed artifacts; the [`Pipeline`] only threads
//! each stage's output into the next. Retrying is done here, around the
//! whole sequence, never inside a stage.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use yahoo_chart_api::Client;

use crate::artifacts::{ArtifactLayout, CleanArtifact, ExtractionArtifact, LoadScriptArtifact};
use crate::config::PipelineConfig;
use crate::engine::WarehouseEngine;
use crate::error::PipelineError;
use crate::{extract, load_script, validate};

/// Outcome of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_date: NaiveDate,
    pub attempts: u32,
    pub extraction: ExtractionArtifact,
    pub clean: CleanArtifact,
    pub script: LoadScriptArtifact,
    pub executed: bool,
}

/// A configured pipeline. Holds the immutable configuration and the chart
/// client built from it.
pub struct Pipeline {
    config: PipelineConfig,
    client: Client,
    layout: ArtifactLayout,
    engine: WarehouseEngine,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let client = extract::client_from_config(&config.source)?;
        let layout = ArtifactLayout::new(&config.artifacts.output_dir);
        let engine = WarehouseEngine::from_config(&config.warehouse);
        Ok(Self {
            config,
            client,
            layout,
            engine,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn engine(&self) -> &WarehouseEngine {
        &self.engine
    }

    pub async fn extract(&self, run_date: NaiveDate) -> Result<ExtractionArtifact, PipelineError> {
        extract::extract(&self.client, &self.config, &self.layout, run_date).await
    }

    pub fn validate(&self, input: &Path, run_date: NaiveDate) -> Result<CleanArtifact, PipelineError> {
        validate::validate(input, &self.layout, run_date)
    }

    pub fn generate(
        &self,
        clean: &Path,
        run_date: NaiveDate,
    ) -> Result<LoadScriptArtifact, PipelineError> {
        load_script::generate(clean, &self.config.warehouse, &self.layout, run_date)
    }

    pub async fn load(&self, script: &Path) -> Result<(), PipelineError> {
        self.engine.execute(script).await
    }

    fn check_run_date(&self, run_date: NaiveDate) -> Result<(), PipelineError> {
        let start_date = self.config.schedule.start_date;
        if run_date < start_date {
            return Err(PipelineError::RunDateOutOfRange {
                run_date,
                start_date,
            });
        }
        Ok(())
    }

    /// One pass through extract, validate, generate and optionally load.
    pub async fn run_once(
        &self,
        run_date: NaiveDate,
        execute: bool,
    ) -> Result<RunSummary, PipelineError> {
        self.check_run_date(run_date)?;
        let extraction = self.extract(run_date).await?;
        let clean = self.validate(&extraction.path, run_date)?;
        let script = self.generate(&clean.path, run_date)?;
        if execute {
            self.load(&script.path).await?;
        }
        Ok(RunSummary {
            run_date,
            attempts: 1,
            extraction,
            clean,
            script,
            executed: execute,
        })
    }

    /// Runs the pipeline, retrying the whole run up to `schedule.retries`
    /// more times on retryable failures.
    pub async fn run(&self, run_date: NaiveDate, execute: bool) -> Result<RunSummary, PipelineError> {
        let max_attempts = self.config.schedule.max_attempts();
        let mut attempt = 1;
        loop {
            match self.run_once(run_date, execute).await {
                Ok(mut summary) => {
                    summary.attempts = attempt;
                    tracing::info!("Run for {} succeeded on attempt {}", run_date, attempt);
                    return Ok(summary);
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        "Run for {} failed on attempt {}/{}: {}; retrying in {:?}",
                        run_date,
                        attempt,
                        max_attempts,
                        err,
                        self.config.schedule.retry_delay()
                    );
                    tokio::time::sleep(self.config.schedule.retry_delay()).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!("Run for {} failed: {}", run_date, err);
                    return Err(err);
                }
            }
        }
    }
}
