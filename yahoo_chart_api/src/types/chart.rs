use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes a field the pipeline never reads, falling back to the
/// default when the value has an unexpected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Top-level document returned by `/v8/finance/chart/{symbol}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

/// Either a list of results or an error object; Yahoo sets the other to `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartResult {
    #[serde(default, deserialize_with = "lenient")]
    pub meta: Option<ChartMeta>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<Vec<i64>>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange_name: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

/// Per-bar OHLC series. Entries are `null` for bars without a print.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default, deserialize_with = "lenient")]
    pub open: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub high: Vec<Option<f64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// The first close of the first quote series of the first result.
    ///
    /// Only the first element is consulted; with `range=1d` that is the
    /// most recent session. Returns `None` if any level is missing or the
    /// close itself is `null`.
    pub fn first_close(&self) -> Option<f64> {
        self.chart
            .result
            .as_ref()?
            .first()?
            .indicators
            .quote
            .first()?
            .close
            .first()
            .copied()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn first_close_present() {
        let resp = parse(
            r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[12.5,13.0]}]}}],"error":null}}"#,
        );
        assert_eq!(resp.first_close(), Some(12.5));
    }

    #[test]
    fn first_close_null() {
        let resp = parse(
            r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#,
        );
        assert_eq!(resp.first_close(), None);
    }

    #[test]
    fn meta_without_symbol_keeps_close() {
        let resp = parse(
            r#"{"chart":{"result":[{"meta":{"currency":"EGP"},"indicators":{"quote":[{"close":[12.5]}]}}],"error":null}}"#,
        );
        let meta = resp.chart.result.as_ref().unwrap()[0].meta.as_ref().unwrap();
        assert_eq!(meta.symbol, None);
        assert_eq!(meta.currency.as_deref(), Some("EGP"));
        assert_eq!(resp.first_close(), Some(12.5));
    }

    #[test]
    fn odd_unread_fields_do_not_fail_parse() {
        let resp = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":42,"regularMarketPrice":"n/a"},
                "timestamp":"soon",
                "indicators":{"quote":[{"open":["x"],"high":{},"low":null,"close":[9.75]}]}
            }],"error":null}}"#,
        );
        let result = &resp.chart.result.as_ref().unwrap()[0];
        assert!(result.meta.is_none());
        assert!(result.timestamp.is_none());
        assert!(result.indicators.quote[0].open.is_empty());
        assert_eq!(resp.first_close(), Some(9.75));
    }

    #[test]
    fn first_close_missing_levels() {
        assert_eq!(parse(r#"{"chart":{"result":[]}}"#).first_close(), None);
        assert_eq!(parse(r#"{"chart":{"result":null}}"#).first_close(), None);
        assert_eq!(parse(r#"{"chart":{"result":[{}]}}"#).first_close(), None);
        assert_eq!(
            parse(r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}]}}"#).first_close(),
            None
        );
    }
}
