//! HTTP Headers Utility
//!
//! Header construction for provider requests, plus masking for anything logged.

use crate::error::LlmError;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::collections::HashMap;

/// Builder that validates header names and values as they are added
#[derive(Debug, Default)]
pub struct HeaderMapBuilder {
    headers: HeaderMap,
}

impl HeaderMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, failing on names or values that are not valid HTTP
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, LlmError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            LlmError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            LlmError::ConfigurationError(format!("Invalid value for header '{name}': {e}"))
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Add a secret-bearing header; the value is marked sensitive so it is never printed
    pub fn secret_header(mut self, name: &str, value: &str) -> Result<Self, LlmError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            LlmError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
        })?;
        let mut header_value = HeaderValue::from_str(value)
            .map_err(|e| LlmError::ConfigurationError(format!("Invalid API key format: {e}")))?;
        header_value.set_sensitive(true);
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn json_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    pub fn user_agent(self, user_agent: &str) -> Result<Self, LlmError> {
        self.header(USER_AGENT.as_str(), user_agent)
    }

    /// Add caller-supplied headers; these may override earlier entries
    pub fn extend(mut self, custom_headers: &HashMap<String, String>) -> Result<Self, LlmError> {
        for (name, value) in custom_headers {
            self = self.header(name, value)?;
        }
        Ok(self)
    }

    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

/// Shorten a credential for logs: keeps a short prefix and the last four characters.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Render headers as a JSON object for debug logs, masking sensitive values
pub fn headers_for_logging(headers: &HeaderMap) -> String {
    let rendered: HashMap<&str, String> = headers
        .iter()
        .map(|(name, value)| {
            let shown = if value.is_sensitive() {
                mask_secret(value.to_str().unwrap_or_default())
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str(), shown)
        })
        .collect();
    serde_json::to_string(&rendered).unwrap_or_else(|_| format!("{rendered:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_validates_headers() {
        let headers = HeaderMapBuilder::new()
            .secret_header("x-api-key", "sk-ant-test-key-123456")
            .unwrap()
            .json_content_type()
            .header("anthropic-version", "2023-06-01")
            .unwrap()
            .build();

        assert_eq!(headers.get("anthropic-version").unwrap(), "2023-06-01");
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert!(headers.get("x-api-key").unwrap().is_sensitive());
    }

    #[test]
    fn rejects_invalid_header_name() {
        let err = HeaderMapBuilder::new().header("bad header", "v").unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }

    #[test]
    fn secrets_are_masked_in_logs() {
        let headers = HeaderMapBuilder::new()
            .secret_header("x-api-key", "sk-ant-api03-abcdefghijkl")
            .unwrap()
            .build();
        let logged = headers_for_logging(&headers);
        assert!(!logged.contains("abcdefghijkl"));
        assert!(logged.contains("sk-ant...ijkl"));
        assert_eq!(mask_secret("short"), "****");
    }
}
