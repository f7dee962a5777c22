//! Custom error types for faqrag

use thiserror::Error;

/// Main error type for faqrag operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store unreachable: {0}")]
    Connection(String),

    #[error("Store rejected credentials: {0}")]
    Auth(String),

    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    #[error("Collection '{0}' not found: run with --create first")]
    CollectionNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Crawl error: {0}")]
    Crawl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// True for errors raised before any network activity
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::TomlParse(_))
    }
}

/// Result type alias for faqrag
pub type Result<T> = std::result::Result<T, Error>;
