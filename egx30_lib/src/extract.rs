//! Extraction stage: one chart request per configured ticker, sequentially.
//!
//! A ticker that fails (network, payload, missing close) is logged and
//! skipped. The stage only fails when no ticker yields a record.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use yahoo_chart_api::{ChartQuery, Client};

use crate::artifacts::{write_artifact, ArtifactLayout, ExtractionArtifact};
use crate::config::{PipelineConfig, SourceConfig};
use crate::error::{PipelineError, SymbolError};
use crate::symbol::{universe, TickerSymbol};

/// Header of the extraction artifact.
pub const EXTRACTION_HEADER: [&str; 3] = ["date", "stock_symbol", "price"];

/// One extracted close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub date: NaiveDate,
    /// Normalized form.
    pub symbol: String,
    /// Always carries exactly two fractional digits.
    pub price: Decimal,
}

/// Builds the chart client from the source settings.
pub fn client_from_config(source: &SourceConfig) -> Result<Client, PipelineError> {
    Ok(Client::with_options(
        &source.base_url,
        &source.user_agent,
        source.timeout(),
    )?)
}

pub fn chart_query(source: &SourceConfig) -> ChartQuery {
    ChartQuery::new()
        .with_interval(&source.interval)
        .with_range(&source.range)
}

/// Rounds a reported close to two decimals (half to even on the exact
/// binary value). Non-finite or out-of-range values yield `None`.
pub fn round_price(close: f64) -> Option<Decimal> {
    if !close.is_finite() {
        return None;
    }
    let mut price = Decimal::from_f64_retain(close)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    price.rescale(2);
    Some(price)
}

/// Fetches and converts the latest close for one ticker.
pub async fn fetch_record(
    client: &Client,
    query: &ChartQuery,
    ticker: &TickerSymbol,
    run_date: NaiveDate,
) -> Result<PriceRecord, SymbolError> {
    let close = client
        .latest_close(ticker.source(), query)
        .await
        .map_err(SymbolError::from_api)?
        .ok_or_else(|| SymbolError::Parse("no close price in response".to_string()))?;
    let price = round_price(close)
        .ok_or_else(|| SymbolError::Parse(format!("close {} is not a usable price", close)))?;
    Ok(PriceRecord {
        date: run_date,
        symbol: ticker.normalized().to_string(),
        price,
    })
}

/// Queries every ticker in order. Returns the records and the source-form
/// symbols that were skipped.
pub async fn collect_batch(
    client: &Client,
    query: &ChartQuery,
    tickers: &[TickerSymbol],
    run_date: NaiveDate,
) -> (Vec<PriceRecord>, Vec<String>) {
    let mut records = Vec::with_capacity(tickers.len());
    let mut skipped = Vec::new();

    for ticker in tickers {
        match fetch_record(client, query, ticker, run_date).await {
            Ok(record) => {
                tracing::info!("Extracted {}: {}", record.symbol, record.price);
                records.push(record);
            }
            Err(err) => {
                tracing::warn!("Skipping {}: {}", ticker, err);
                skipped.push(ticker.source().to_string());
            }
        }
    }

    (records, skipped)
}

/// Serializes records as `date,stock_symbol,price` with a header row.
pub fn render_batch(records: &[PriceRecord]) -> Result<Vec<u8>, PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(Vec::new());
    writer.write_record(EXTRACTION_HEADER)?;
    for record in records {
        writer.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            record.symbol.clone(),
            record.price.to_string(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| PipelineError::Csv(e.into_error().into()))
}

/// Runs the extraction stage for `run_date` and persists the batch.
pub async fn extract(
    client: &Client,
    config: &PipelineConfig,
    layout: &ArtifactLayout,
    run_date: NaiveDate,
) -> Result<ExtractionArtifact, PipelineError> {
    let tickers = universe(&config.universe.symbols, &config.universe.exchange_suffix);
    let query = chart_query(&config.source);
    tracing::info!(
        "Starting extraction of {} symbols for {}",
        tickers.len(),
        run_date
    );

    let (records, skipped) = collect_batch(client, &query, &tickers, run_date).await;
    if records.is_empty() {
        tracing::error!("No data extracted for {}", run_date);
        return Err(PipelineError::EmptyBatch { run_date });
    }

    let path = layout.extraction_path(run_date);
    write_artifact(&path, &render_batch(&records)?)?;
    tracing::info!(
        "Saved {} records to {} ({} skipped)",
        records.len(),
        path.display(),
        skipped.len()
    );

    Ok(ExtractionArtifact {
        path,
        run_date,
        records: records.len(),
        skipped,
    })
}
