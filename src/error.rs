//! Error Handling
//!
//! A single error type is shared by the provider client, the trace context and the
//! exporters, so a provider failure can travel through an observation untouched.
//!
//! ```rust
//! use llm_observe::error::LlmError;
//!
//! let error = LlmError::api_error(503, "Service unavailable");
//! assert!(error.is_retryable());
//! assert_eq!(error.status_code(), Some(503));
//! ```

use thiserror::Error;

/// Errors produced by this crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    /// Transport-level failure (connection refused, TLS, body read)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Non-success status returned by a remote API
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timed out: {0}")]
    TimeoutError(String),

    /// A response could not be turned into the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),
}

impl LlmError {
    /// Shorthand for an [`LlmError::ApiError`] without details
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status associated with the error, when there is one
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::AuthenticationError(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::RateLimitError(_) => Some(429),
            _ => None,
        }
    }

    /// Whether repeating the same request could succeed.
    ///
    /// Nothing in this crate retries; the flag is informational for callers.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { code, .. } => matches!(*code, 408 | 409 | 429 | 500..=599),
            Self::RateLimitError(_) | Self::TimeoutError(_) | Self::HttpError(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overloaded_and_server_errors_are_retryable() {
        assert!(LlmError::api_error(529, "overloaded").is_retryable());
        assert!(LlmError::api_error(500, "boom").is_retryable());
        assert!(!LlmError::api_error(400, "bad").is_retryable());
        assert!(!LlmError::ParseError("no content".into()).is_retryable());
    }

    #[test]
    fn status_codes_for_typed_variants() {
        assert_eq!(
            LlmError::AuthenticationError("nope".into()).status_code(),
            Some(401)
        );
        assert_eq!(LlmError::RateLimitError("slow".into()).status_code(), Some(429));
        assert_eq!(LlmError::JsonError("eof".into()).status_code(), None);
    }
}
