//! Error types for the price ticker

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when querying the market data API
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider answered with a non-success status
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

/// Errors that can occur while loading, saving or editing the watchlist
#[derive(Debug, Error)]
pub enum WatchlistError {
    /// Reading or writing the watchlist file failed
    #[error("Watchlist file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Watchlist file is not a JSON array of asset ids
    #[error("Malformed watchlist file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Asset id is empty or has characters outside `[a-z0-9-]`
    #[error("Invalid asset id: {0:?}")]
    InvalidAssetId(String),
}

impl WatchlistError {
    /// Creates an Io error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a Parse error for the given path
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}
