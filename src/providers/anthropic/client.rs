//! Anthropic Client Implementation

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::ExposeSecret;
use std::time::Instant;
use tracing::{debug, error, info};

use super::config::AnthropicConfig;
use super::errors::parse_error_body;
use super::MessagesApi;
use crate::error::LlmError;
use crate::types::{CompletionParams, MessagesResponse};
use crate::utils::HeaderMapBuilder;
use crate::utils::http_headers::headers_for_logging;

const PROVIDER: &str = "anthropic";

/// HTTP client for `POST /v1/messages`
#[derive(Clone)]
pub struct AnthropicClient {
    config: AnthropicConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("provider_name", &PROVIDER)
            .field("base_url", &self.config.base_url)
            .field("api_version", &self.config.api_version)
            .field("timeout", &self.config.timeout)
            .field("custom_headers", &self.config.custom_headers.len())
            .finish()
    }
}

impl AnthropicClient {
    /// Build a client with its own connection pool
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(config, http_client))
    }

    /// Reuse an existing `reqwest::Client`
    pub fn with_http_client(config: AnthropicConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Build from `ANTHROPIC_*` environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(AnthropicConfig::from_env()?)
    }

    pub const fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        Ok(HeaderMapBuilder::new()
            .secret_header("x-api-key", self.config.api_key.expose_secret())?
            .json_content_type()
            .header("anthropic-version", &self.config.api_version)?
            .user_agent(concat!("llm-observe/", env!("CARGO_PKG_VERSION")))?
            .extend(&self.config.custom_headers)?
            .build())
    }
}

#[async_trait]
impl MessagesApi for AnthropicClient {
    async fn create(&self, params: &CompletionParams) -> Result<MessagesResponse, LlmError> {
        let url = self.config.messages_url();
        let headers = self.headers()?;
        let model = params.get("model").and_then(|m| m.as_str()).unwrap_or("<unset>");
        let started = Instant::now();

        info!(provider = PROVIDER, model, url = %url, "Request started");
        debug!(
            provider = PROVIDER,
            request_headers = %headers_for_logging(&headers),
            request_body = %serde_json::Value::from(params.as_map().clone()),
            "Request details"
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        if !status.is_success() {
            error!(
                provider = PROVIDER,
                model,
                status_code = status.as_u16(),
                duration_ms,
                error_text = %body,
                "Request failed"
            );
            return Err(parse_error_body(status.as_u16(), &body));
        }

        debug!(provider = PROVIDER, response_body = %body, "Response body");
        let decoded: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::ParseError(format!("Failed to decode Anthropic response: {e}"))
        })?;

        info!(
            provider = PROVIDER,
            model,
            duration_ms,
            input_tokens = decoded.usage.input_tokens,
            output_tokens = decoded.usage.output_tokens,
            "Request completed"
        );
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_key_and_version() {
        let client = AnthropicClient::new(
            AnthropicConfig::new("sk-ant-unit").with_header("anthropic-beta", "tools-2024-04-04"),
        )
        .unwrap();
        let headers = client.headers().unwrap();

        assert_eq!(headers.get("x-api-key").unwrap(), "sk-ant-unit");
        assert_eq!(headers.get("anthropic-version").unwrap(), "2023-06-01");
        assert_eq!(headers.get("anthropic-beta").unwrap(), "tools-2024-04-04");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = AnthropicClient::new(AnthropicConfig::new("sk-ant-secret-value")).unwrap();
        assert!(!format!("{client:?}").contains("sk-ant-secret-value"));
    }
}
