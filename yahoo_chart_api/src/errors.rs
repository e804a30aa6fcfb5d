//! Error types for the chart API client.

/// Errors that can occur when requesting a chart.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The HTTP request could not be completed (connection refused, DNS, TLS, ...).
    #[error("Request failed: {0}")]
    RequestFailed(String),
    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body was not a chart document.
    #[error("Failed to parse chart response: {0}")]
    Parse(String),
    /// The chart document carried an error object instead of a result.
    #[error("Chart API error {code}: {description}")]
    Api { code: String, description: String },
    /// The base URL or symbol could not be turned into a request URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// True for failures of the transport itself, as opposed to a bad payload.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_) | Self::Timeout | Self::HttpStatus { .. }
        )
    }
}
