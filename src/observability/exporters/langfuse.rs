//! Langfuse Exporter
//!
//! Sends ingestion batches to `POST {host}/api/public/ingestion`.
//!
//! ```rust,no_run
//! use llm_observe::observability::{LangfuseConfig, TraceContext};
//! use llm_observe::observability::exporters::LangfuseExporter;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), llm_observe::error::LlmError> {
//! let config = LangfuseConfig::builder()
//!     .public_key("pk-lf-...")
//!     .secret_key("sk-lf-...")
//!     .build();
//! let exporter = LangfuseExporter::new(config.clone())?;
//! let ctx = TraceContext::new(config, Arc::new(exporter));
//! # Ok(())
//! # }
//! ```

use crate::error::LlmError;
use crate::observability::config::LangfuseConfig;
use crate::observability::events::IngestionEvent;
use crate::observability::exporters::TelemetryExporter;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Langfuse exporter
pub struct LangfuseExporter {
    client: Client,
    config: LangfuseConfig,
}

impl std::fmt::Debug for LangfuseExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LangfuseExporter")
            .field("host", &self.config.host)
            .field("public_key", &self.config.public_key)
            .field("flush_at", &self.config.flush_at)
            .finish()
    }
}

impl LangfuseExporter {
    /// Requires both API keys
    pub fn new(config: LangfuseConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;
        Self::with_http_client(config, client)
    }

    pub fn with_http_client(config: LangfuseConfig, client: Client) -> Result<Self, LlmError> {
        if config.public_key.is_none() || config.secret_key.is_none() {
            return Err(LlmError::MissingApiKey(
                "LANGFUSE_PUBLIC_KEY and LANGFUSE_SECRET_KEY are required".to_string(),
            ));
        }
        Ok(Self { client, config })
    }

    async fn send_batch(&self, batch: &[IngestionEvent]) -> Result<(), LlmError> {
        let url = self.config.ingestion_url();
        let (Some(public_key), Some(secret_key)) =
            (&self.config.public_key, &self.config.secret_key)
        else {
            return Err(LlmError::MissingApiKey("Langfuse keys are not set".to_string()));
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(public_key, Some(secret_key.expose_secret()))
            .json(&IngestionRequest { batch })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::ApiError {
                code: status.as_u16(),
                message: format!("Langfuse API error: {body}"),
                details: None,
            });
        }

        // A 207 lists per-event failures while the request as a whole succeeds.
        let Ok(outcome) = serde_json::from_str::<IngestionResponse>(&body) else {
            return Ok(());
        };
        if outcome.errors.is_empty() {
            tracing::debug!(accepted = outcome.successes.len(), "Langfuse batch ingested");
            return Ok(());
        }

        for rejected in &outcome.errors {
            tracing::warn!(
                event_id = %rejected.id,
                status = rejected.status,
                message = rejected.message.as_deref().unwrap_or(""),
                "Langfuse rejected event"
            );
        }
        Err(LlmError::ApiError {
            code: status.as_u16(),
            message: format!(
                "Langfuse rejected {} of {} events",
                outcome.errors.len(),
                batch.len()
            ),
            details: serde_json::to_value(&outcome.errors).ok(),
        })
    }
}

#[async_trait::async_trait]
impl TelemetryExporter for LangfuseExporter {
    async fn export(&self, batch: &[IngestionEvent]) -> Result<(), LlmError> {
        for chunk in batch.chunks(self.config.flush_at.max(1)) {
            self.send_batch(chunk).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct IngestionRequest<'a> {
    batch: &'a [IngestionEvent],
}

#[derive(Debug, Default, Deserialize)]
struct IngestionResponse {
    #[serde(default)]
    successes: Vec<IngestionOutcome>,
    #[serde(default)]
    errors: Vec<IngestionOutcome>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IngestionOutcome {
    id: String,
    status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}
