//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is loaded once (embedded TOML, a file, then
//! environment overrides), validated, and passed by reference into every
//! stage. Nothing reads configuration from ambient state after that.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::load_script::Identifier;

/// Environment variable overriding `source.base_url`.
pub const ENV_BASE_URL: &str = "EGX30_BASE_URL";
/// Environment variable overriding `artifacts.output_dir`.
pub const ENV_OUTPUT_DIR: &str = "EGX30_OUTPUT_DIR";
/// Environment variable overriding `source.timeout_secs`.
pub const ENV_TIMEOUT_SECS: &str = "EGX30_TIMEOUT_SECS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub universe: UniverseConfig,
    pub artifacts: ArtifactConfig,
    pub warehouse: WarehouseConfig,
    pub schedule: ScheduleConfig,
}

/// Upstream chart endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub interval: String,
    pub range: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: yahoo_chart_api::DEFAULT_BASE_URL.to_string(),
            timeout_secs: yahoo_chart_api::DEFAULT_TIMEOUT.as_secs(),
            user_agent: yahoo_chart_api::DEFAULT_USER_AGENT.to_string(),
            interval: "1d".to_string(),
            range: "1d".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The fixed ticker universe, in source form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniverseConfig {
    pub symbols: Vec<String>,
    pub exchange_suffix: String,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            symbols: [
                "EGS01041C010.CA",
                "EGS01071C017.CA",
                "EGS01081C016.CA",
                "EGS02021C011.CA",
                "EGS02051C018.CA",
                "EGS02091C014.CA",
                "EGS02211C018.CA",
                "EGS02291C010.CA",
                "EGS07061C012.CA",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exchange_suffix: ".CA".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactConfig {
    pub output_dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/tmp"),
        }
    }
}

/// Warehouse table names and the command that executes a load script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarehouseConfig {
    pub database: Option<String>,
    pub staging_table: String,
    pub target_table: String,
    pub partition_column: String,
    pub engine_command: String,
    pub engine_args: Vec<String>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database: None,
            staging_table: "egx30_staging".to_string(),
            target_table: "egx30_stocks".to_string(),
            partition_column: "trade_date".to_string(),
            engine_command: "hive".to_string(),
            engine_args: vec!["-f".to_string()],
        }
    }
}

/// Ownership and scheduling metadata. `retries` and `retry_delay_secs` apply
/// to whole runs, never to individual stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    pub owner: String,
    pub cron: String,
    pub start_date: NaiveDate,
    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            owner: "data_team".to_string(),
            cron: "0 18 * * *".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            retries: 2,
            retry_delay_secs: 300,
        }
    }
}

impl ScheduleConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// The first attempt plus `retries` more.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl PipelineConfig {
    /// Parses and validates a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, PipelineError> {
        let config: Self =
            toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration embedded at compile time.
    pub fn embedded() -> Result<Self, PipelineError> {
        Self::from_toml_str(include_str!("../../seed_data/pipeline.toml"))
    }

    /// Loads a configuration file from disk.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Applies `EGX30_*` overrides. `lookup` is usually `std::env::var(..).ok()`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.source.base_url = url;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.artifacts.output_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.source.timeout_secs = secs.trim().parse().map_err(|_| {
                PipelineError::Config(format!("{} must be an integer, got {:?}", ENV_TIMEOUT_SECS, secs))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks invariants the stages rely on.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.universe.symbols.is_empty() {
            return Err(PipelineError::Config("universe.symbols is empty".into()));
        }
        if let Some(blank) = self.universe.symbols.iter().position(|s| s.trim().is_empty()) {
            return Err(PipelineError::Config(format!(
                "universe.symbols[{}] is blank",
                blank
            )));
        }
        if let Some(bad) = self
            .universe
            .symbols
            .iter()
            .position(|s| s.contains([',', '"']))
        {
            return Err(PipelineError::Config(format!(
                "universe.symbols[{}] contains a delimiter or quote",
                bad
            )));
        }
        if self.source.timeout_secs == 0 {
            return Err(PipelineError::Config("source.timeout_secs must be positive".into()));
        }
        if self.warehouse.engine_command.trim().is_empty() {
            return Err(PipelineError::Config("warehouse.engine_command is empty".into()));
        }
        if let Some(db) = &self.warehouse.database {
            Identifier::parse(db)?;
        }
        Identifier::parse(&self.warehouse.staging_table)?;
        Identifier::parse(&self.warehouse.target_table)?;
        Identifier::parse(&self.warehouse.partition_column)?;
        Ok(())
    }
}
