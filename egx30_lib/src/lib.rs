//! Library layer for the EGX30 daily close pipeline.
//!
//! Three stages, each a function from the previous stage's artifact and the
//! run date to a new artifact: [`extract`], [`validate`], and
//! [`load_script`]. [`Pipeline`] wires them together from a
//! [`PipelineConfig`] and retries whole runs.

pub mod artifacts;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod load_script;
pub mod pipeline;
pub mod symbol;
pub mod validate;

pub use yahoo_chart_api;

pub use artifacts::{ArtifactLayout, CleanArtifact, ExtractionArtifact, LoadScriptArtifact};
pub use config::PipelineConfig;
pub use engine::WarehouseEngine;
pub use error::{MalformedRowError, PipelineError, SymbolError};
pub use extract::PriceRecord;
pub use load_script::{LoadScript, LoadScriptBuilder, Statement};
pub use pipeline::{Pipeline, RunSummary};
pub use symbol::TickerSymbol;
pub use validate::CleanRow;
