//! Date-keyed artifact locations and the typed handles passed between stages.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::PipelineError;

/// Where each stage writes its artifact for a given run date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    output_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `egx30_<date>.csv`
    pub fn extraction_path(&self, run_date: NaiveDate) -> PathBuf {
        self.output_dir
            .join(format!("egx30_{}.csv", run_date.format("%Y-%m-%d")))
    }

    /// `hive_data_<date>.txt`
    pub fn clean_path(&self, run_date: NaiveDate) -> PathBuf {
        self.output_dir
            .join(format!("hive_data_{}.txt", run_date.format("%Y-%m-%d")))
    }

    /// `load_hive_<date>.hql`
    pub fn script_path(&self, run_date: NaiveDate) -> PathBuf {
        self.output_dir
            .join(format!("load_hive_{}.hql", run_date.format("%Y-%m-%d")))
    }
}

/// Output of the extractor.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionArtifact {
    pub path: PathBuf,
    pub run_date: NaiveDate,
    pub records: usize,
    /// Source-form symbols that produced no record.
    pub skipped: Vec<String>,
}

/// Output of the validator.
#[derive(Debug, Clone, Serialize)]
pub struct CleanArtifact {
    pub path: PathBuf,
    pub run_date: NaiveDate,
    pub rows_read: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub kept: usize,
}

/// Output of the load script generator.
#[derive(Debug, Clone, Serialize)]
pub struct LoadScriptArtifact {
    pub path: PathBuf,
    pub run_date: NaiveDate,
    pub statements: usize,
}

/// Writes `contents` to `path` through a sibling temp file and a rename, so a
/// reader never observes a half-written artifact.
pub fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).map_err(|e| PipelineError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}
