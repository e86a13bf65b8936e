//! Error types for shelfsight-llm

use shelfsight_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DescribeError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    #[error("API key not set for backend: {0}")]
    MissingApiKey(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DescribeError>;

impl From<DescribeError> for CoreError {
    fn from(err: DescribeError) -> Self {
        CoreError::Description(err.to_string())
    }
}
