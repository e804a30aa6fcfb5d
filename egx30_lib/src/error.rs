//! Error types for the pipeline stages.
//!
//! Per-symbol ([`SymbolError`]) and per-row ([`MalformedRowError`]) failures
//! are contained inside their stage. Only [`PipelineError`] escapes a stage.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Why a single symbol produced no record during extraction.
#[derive(Error, Debug)]
pub enum SymbolError {
    /// Request failure, timeout, or non-success status.
    #[error("network error: {0}")]
    Network(#[source] yahoo_chart_api::Error),
    /// Malformed payload, API error object, or absent/null close.
    #[error("parse error: {0}")]
    Parse(String),
}

impl SymbolError {
    /// Sorts an upstream client error into the network/parse split.
    pub fn from_api(err: yahoo_chart_api::Error) -> Self {
        if err.is_network() {
            Self::Network(err)
        } else {
            Self::Parse(err.to_string())
        }
    }
}

/// A raw extraction row that could not be turned into a clean row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed row at line {line}: {reason}")]
pub struct MalformedRowError {
    pub line: u64,
    pub reason: String,
}

/// Run-level failures.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No configured symbol yielded a price.
    #[error("no records extracted for {run_date}")]
    EmptyBatch { run_date: NaiveDate },
    #[error("I/O error on {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("Chart client error: {0}")]
    Client(#[from] yahoo_chart_api::Error),
    #[error("Warehouse engine failed: {status}")]
    EngineFailed { status: String },
    #[error("Run date {run_date} precedes pipeline start date {start_date}")]
    RunDateOutOfRange {
        run_date: NaiveDate,
        start_date: NaiveDate,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether re-running the whole pipeline could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EmptyBatch { .. } | Self::Io { .. } | Self::EngineFailed { .. }
        )
    }
}
