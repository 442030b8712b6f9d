use crate::error::LlmError;
use serde::Deserialize;
use serde_json::Value;

/// `{"type":"error","error":{"type":..,"message":..}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Turn a non-success response body into an error.
///
/// Typed Anthropic errors map onto the matching [`LlmError`] variant. Anything else,
/// including bodies that are not JSON, becomes an `ApiError` carrying the HTTP status.
pub fn parse_error_body(status_code: u16, body: &str) -> LlmError {
    let Ok(details) = serde_json::from_str::<Value>(body) else {
        return LlmError::api_error(status_code, body.to_string());
    };
    let Ok(ErrorEnvelope { error }) = ErrorEnvelope::deserialize(&details) else {
        return LlmError::ApiError {
            code: status_code,
            message: body.to_string(),
            details: Some(details),
        };
    };

    let ErrorPayload { kind, message } = error;
    match kind.as_str() {
        "authentication_error" => LlmError::AuthenticationError(message),
        "permission_error" => LlmError::AuthenticationError(format!("Permission denied: {message}")),
        "invalid_request_error" => LlmError::InvalidInput(message),
        "request_too_large" => LlmError::InvalidInput(format!("Request too large: {message}")),
        "not_found_error" => LlmError::NotFound(message),
        "rate_limit_error" => LlmError::RateLimitError(message),
        // Reported as 529 whatever status the response carried.
        "overloaded_error" => LlmError::ApiError {
            code: 529,
            message: format!("Anthropic service overloaded: {message}"),
            details: Some(details),
        },
        other => LlmError::ApiError {
            code: status_code,
            message: format!("Anthropic API error ({other}): {message}"),
            details: Some(details),
        },
    }
}
