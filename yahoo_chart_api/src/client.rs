//! HTTP client for the Yahoo Finance v8 chart API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    query::{ChartQuery, Query},
    types::ChartResponse,
    Error,
};

/// Production host of the chart API.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Per-request timeout used when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Yahoo rejects requests without a browser-like user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// HTTP client for the chart API.
///
/// Holds one `reqwest::Client` for its lifetime. Every request is bounded by
/// the configured timeout, which is the only cancellation mechanism.
pub struct Client {
    /// Base URL for the API. Defaults to [`DEFAULT_BASE_URL`].
    base_api_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client pointing at the production chart API.
    pub fn new() -> Result<Self, Error> {
        Self::with_options(DEFAULT_BASE_URL, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_options(base_url, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    /// Creates a client with every knob set explicitly.
    pub fn with_options(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed(e.to_string())
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn chart_url(&self, symbol: &str, query: &ChartQuery) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base_api_url).map_err(|e| {
            tracing::error!("Invalid base URL {}: {}", self.base_api_url, e);
            Error::InvalidUrl(e.to_string())
        })?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{} cannot be a base", self.base_api_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(query.add_to_url(&url))
    }

    async fn get<T>(&self, url: Url) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let resp = self.http.get(url).send().await.map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::debug!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::debug!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Parse(e.to_string())
        })
    }

    /// Fetches the chart document for `symbol`.
    ///
    /// A document whose `result` is absent but carries an `error` object is
    /// reported as [`Error::Api`].
    pub async fn get_chart(&self, symbol: &str, query: &ChartQuery) -> Result<ChartResponse, Error> {
        let url = self.chart_url(symbol, query)?;
        let resp: ChartResponse = self.get(url).await?;
        if resp.chart.result.is_none() {
            if let Some(err) = &resp.chart.error {
                return Err(Error::Api {
                    code: err.code.clone(),
                    description: err.description.clone(),
                });
            }
        }
        Ok(resp)
    }

    /// Fetches the most recent close for `symbol`, or `None` if the source
    /// reported none.
    pub async fn latest_close(&self, symbol: &str, query: &ChartQuery) -> Result<Option<f64>, Error> {
        Ok(self.get_chart(symbol, query).await?.first_close())
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::RequestFailed(e.to_string())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
