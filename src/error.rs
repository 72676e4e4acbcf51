//! Error types shared across the crate.
//!
//! Only collaborator failures are errors here. Defective input (missing
//! content, unparseable amounts, absent timestamps) is a normal filtering
//! outcome and never reaches these types.

use thiserror::Error;

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the feed fetcher collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed {feed} could not be parsed: {message}")]
    Feed { feed: String, message: String },
}

/// Failures while loading configuration or rule tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid pattern {pattern:?}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures that abort a daily selection run.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
