//! Chart query parameters and the [`Query`] trait used to attach them to a URL.

use url::Url;

/// Trait implemented by query builders. Provides URL serialization.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;
}

/// Parameters of a `/v8/finance/chart/{symbol}` request.
///
/// Defaults to one daily bar over the most recent trading day
/// (`interval=1d&range=1d`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartQuery {
    interval: String,
    range: String,
}

impl Default for ChartQuery {
    fn default() -> Self {
        Self {
            interval: "1d".to_string(),
            range: "1d".to_string(),
        }
    }
}

impl ChartQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bar interval (e.g. `1d`, `1h`).
    pub fn with_interval(mut self, interval: &str) -> Self {
        self.interval = interval.to_string();
        self
    }

    /// Sets the lookback range (e.g. `1d`, `5d`, `1mo`).
    pub fn with_range(mut self, range: &str) -> Self {
        self.range = range.to_string();
        self
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn range(&self) -> &str {
        &self.range
    }
}

impl Query for ChartQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("interval", &self.interval)
            .append_pair("range", &self.range);
        url
    }
}
