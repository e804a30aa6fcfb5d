//! Ticker symbols in source form (with exchange suffix) and normalized form.

use std::fmt;

/// A configured ticker. The source form is what the chart API is queried
/// with; everything downstream of extraction stores the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickerSymbol {
    source: String,
    normalized: String,
}

impl TickerSymbol {
    pub fn new(source: &str, exchange_suffix: &str) -> Self {
        let source = source.trim();
        Self {
            source: source.to_string(),
            normalized: normalize_symbol(source, exchange_suffix),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Strips a trailing exchange suffix (e.g. `.CA`). Symbols without the
/// suffix are returned unchanged.
pub fn normalize_symbol(source: &str, exchange_suffix: &str) -> String {
    if exchange_suffix.is_empty() {
        return source.to_string();
    }
    source
        .strip_suffix(exchange_suffix)
        .unwrap_or(source)
        .to_string()
}

/// Builds the universe from configured source symbols.
pub fn universe(symbols: &[String], exchange_suffix: &str) -> Vec<TickerSymbol> {
    symbols
        .iter()
        .map(|s| TickerSymbol::new(s, exchange_suffix))
        .collect()
}
