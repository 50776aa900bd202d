// src/errors.rs

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Provider returned an error: {0}")]
    Upstream(String),

    #[error("No usable rows: {0}")]
    Empty(String),

    #[error("No usable Close column. Columns available: {0:?}")]
    MissingClose(Vec<String>),

    #[error("Unrecognised response shape: {0}")]
    Shape(String),

    #[error("{provider} request timed out after {limit:?}")]
    Timeout {
        provider: &'static str,
        limit: std::time::Duration,
    },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IndicatorError {
    #[error("Cannot compute an EMA over an empty series")]
    EmptyInput,

    #[error("EMA span must be at least 1")]
    ZeroSpan,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Telegram rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}
