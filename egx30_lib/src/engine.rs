//! Runs a load script through the warehouse engine as a subprocess.

use std::path::Path;

use tokio::process::Command;

use crate::config::WarehouseConfig;
use crate::error::PipelineError;

/// The external command that executes a load script, e.g. `hive -f <script>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseEngine {
    command: String,
    args: Vec<String>,
}

impl WarehouseEngine {
    pub fn new(command: &str, args: &[String]) -> Self {
        Self {
            command: command.to_string(),
            args: args.to_vec(),
        }
    }

    pub fn from_config(warehouse: &WarehouseConfig) -> Self {
        Self::new(&warehouse.engine_command, &warehouse.engine_args)
    }

    /// The command line that [`execute`](Self::execute) will spawn.
    pub fn command_line(&self, script: &Path) -> Vec<String> {
        let mut line = Vec::with_capacity(self.args.len() + 2);
        line.push(self.command.clone());
        line.extend(self.args.iter().cloned());
        line.push(script.display().to_string());
        line
    }

    /// Executes the script. A non-zero exit status fails the run.
    pub async fn execute(&self, script: &Path) -> Result<(), PipelineError> {
        tracing::info!("Executing {} with {}", script.display(), self.command);
        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(script)
            .status()
            .await
            .map_err(|e| PipelineError::io(&self.command, e))?;

        if !status.success() {
            tracing::error!("{} exited with {}", self.command, status);
            return Err(PipelineError::EngineFailed {
                status: status.to_string(),
            });
        }
        tracing::info!("Load script {} completed", script.display());
        Ok(())
    }
}
