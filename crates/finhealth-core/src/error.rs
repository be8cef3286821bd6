//! Error types for data operations.
//!
//! [`DataError`] covers everything that can go wrong while fetching, parsing,
//! or caching financial data. Ratio computation itself never produces one of
//! these for missing fields; it downgrades them to unavailable values instead.

use thiserror::Error;

/// Errors that can occur during data operations.
#[derive(Error, Debug)]
pub enum DataError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// No usable data exists for the requested symbol.
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        /// The symbol that was requested.
        symbol: String,
        /// What was missing.
        reason: String,
    },

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// No provider is configured for the requested data kind.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested feature is not supported.
    #[error("Feature not supported: {0}")]
    NotSupported(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl DataError {
    /// Shorthand for [`DataError::DataUnavailable`].
    pub fn unavailable(symbol: impl ToString, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message() {
        let err = DataError::unavailable("AAPL", "income statement is empty");
        assert_eq!(
            err.to_string(),
            "Data not available for AAPL: income statement is empty"
        );
    }
}
