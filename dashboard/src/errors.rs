use thiserror::Error;

/// Any failure while obtaining the latest sample.
///
/// The variants only exist for the diagnostic log line; every one of them is
/// rendered the same way on the dashboard.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telemetry host responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feed collection is empty")]
    EmptyFeed,

    #[error("Feed entry has no value for {field}")]
    MissingField { field: &'static str },

    #[error("Feed entry has non-numeric {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("Poll interval must be greater than zero")]
    ZeroInterval,

    #[error("Invalid base URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("Threshold {name} must be a finite number")]
    Threshold { name: &'static str },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
