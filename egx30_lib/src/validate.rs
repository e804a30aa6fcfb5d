//! Validation stage: drop malformed rows, keep the first row per symbol.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::artifacts::{write_artifact, ArtifactLayout, CleanArtifact};
use crate::error::{MalformedRowError, PipelineError};

/// One row of the clean dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRow {
    pub symbol: String,
    pub price: Decimal,
}

/// Counters reported by [`parse_rows`] and [`dedup`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub rows_read: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub kept: usize,
}

fn parse_price(field: &str) -> Option<Decimal> {
    let field = field.trim();
    Decimal::from_str(field)
        .or_else(|_| Decimal::from_scientific(field))
        .ok()
}

/// Converts one `date,stock_symbol,price` record. The date field is carried
/// through unchecked; only the field count and the price are validated.
pub fn parse_row(line: u64, record: &csv::StringRecord) -> Result<CleanRow, MalformedRowError> {
    if record.len() != 3 {
        return Err(MalformedRowError {
            line,
            reason: format!("expected 3 fields, found {}", record.len()),
        });
    }
    let price = parse_price(&record[2]).ok_or_else(|| MalformedRowError {
        line,
        reason: format!("price {:?} is not a number", &record[2]),
    })?;
    Ok(CleanRow {
        symbol: record[1].to_string(),
        price,
    })
}

/// Reads an extraction artifact, skipping the header and any malformed row.
///
/// Fields are split on every `,`; quotes carry no meaning, so a stray `"`
/// only spoils its own row.
pub fn parse_rows<R: Read>(reader: R) -> Result<(Vec<CleanRow>, ValidationReport), PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut report = ValidationReport::default();

    for result in csv_reader.records() {
        report.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                tracing::debug!("Skipping unreadable row at line {}: {}", line, e);
                report.malformed += 1;
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        match parse_row(line, &record) {
            Ok(row) => rows.push(row),
            Err(err) => {
                tracing::debug!("Skipping {}", err);
                report.malformed += 1;
            }
        }
    }

    Ok((rows, report))
}

/// Keeps the first occurrence of each symbol, preserving input order.
/// Returns the kept rows and the number dropped.
pub fn dedup(rows: Vec<CleanRow>) -> (Vec<CleanRow>, usize) {
    let mut seen = HashSet::new();
    let total = rows.len();
    let unique: Vec<CleanRow> = rows
        .into_iter()
        .filter(|row| seen.insert(row.symbol.clone()))
        .collect();
    let dropped = total - unique.len();
    (unique, dropped)
}

/// Serializes clean rows as headerless `symbol,price`.
pub fn render_clean(rows: &[CleanRow]) -> Result<Vec<u8>, PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record([row.symbol.as_str(), row.price.to_string().as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| PipelineError::Csv(e.into_error().into()))
}

/// Runs the validation stage on the extraction artifact at `input`.
///
/// An input whose rows are all malformed produces an empty clean artifact
/// rather than an error.
pub fn validate(
    input: &Path,
    layout: &ArtifactLayout,
    run_date: NaiveDate,
) -> Result<CleanArtifact, PipelineError> {
    let file = File::open(input).map_err(|e| PipelineError::io(input, e))?;
    let (rows, mut report) = parse_rows(file)?;
    let (unique, duplicates) = dedup(rows);
    report.duplicates = duplicates;
    report.kept = unique.len();

    if report.kept == 0 {
        tracing::warn!(
            "Clean dataset for {} is empty ({} rows read, {} malformed)",
            run_date,
            report.rows_read,
            report.malformed
        );
    }

    let path = layout.clean_path(run_date);
    write_artifact(&path, &render_clean(&unique)?)?;
    tracing::info!(
        "Validated {} unique records ({} malformed, {} duplicates) into {}",
        report.kept,
        report.malformed,
        report.duplicates,
        path.display()
    );

    Ok(CleanArtifact {
        path,
        run_date,
        rows_read: report.rows_read,
        malformed: report.malformed,
        duplicates: report.duplicates,
        kept: report.kept,
    })
}
