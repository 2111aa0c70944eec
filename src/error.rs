use thiserror::Error;

/// Failures of the page source (transport layer).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors surfaced by a member scrape.
///
/// Only configuration and transport problems end up here. Fields or rows
/// that fail to parse degrade to empty values instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("unknown league: {0}")]
    UnknownLeague(String),

    #[error("failed to fix war pid issue: {0}")]
    FixWarPid(#[source] FetchError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
