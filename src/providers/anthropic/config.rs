use crate::error::LlmError;
use secrecy::SecretString;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Connection settings for [`super::AnthropicClient`]
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub api_version: String,
    pub timeout: Duration,
    /// Extra headers sent with every request (e.g. `anthropic-beta`)
    pub custom_headers: HashMap<String, String>,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: ANTHROPIC_VERSION.to_string(),
            timeout: Duration::from_secs(60),
            custom_headers: HashMap::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(name.into(), value.into());
        self
    }

    /// Read `ANTHROPIC_API_KEY` and `ANTHROPIC_BASE_URL` from the process environment
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::MissingApiKey("ANTHROPIC_API_KEY is not set".to_string())
            })?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("ANTHROPIC_BASE_URL").filter(|u| !u.is_empty()) {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    pub(crate) fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn lookup_requires_api_key() {
        let err = AnthropicConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(_)));
    }

    #[test]
    fn lookup_reads_key_and_base_url() {
        let config = AnthropicConfig::from_lookup(|key| match key {
            "ANTHROPIC_API_KEY" => Some("sk-ant-test".to_string()),
            "ANTHROPIC_BASE_URL" => Some("http://localhost:8080/".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.api_key.expose_secret(), "sk-ant-test");
        assert_eq!(config.messages_url(), "http://localhost:8080/v1/messages");
        assert_eq!(config.api_version, ANTHROPIC_VERSION);
    }
}
