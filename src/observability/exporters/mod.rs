//! Telemetry Exporters
//!
//! Exporters ship buffered ingestion events to an observability backend.

pub mod langfuse;
pub mod memory;

pub use langfuse::LangfuseExporter;
pub use memory::InMemoryExporter;

use crate::error::LlmError;
use crate::observability::events::IngestionEvent;

/// Trait for telemetry exporters
#[async_trait::async_trait]
pub trait TelemetryExporter: Send + Sync {
    /// Export a batch of events, in order
    async fn export(&self, batch: &[IngestionEvent]) -> Result<(), LlmError>;

    /// Flush anything the exporter buffers itself
    async fn flush(&self) -> Result<(), LlmError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), LlmError> {
        self.flush().await
    }
}

/// Drops every event; used when export is disabled or unconfigured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExporter;

#[async_trait::async_trait]
impl TelemetryExporter for NoopExporter {
    async fn export(&self, batch: &[IngestionEvent]) -> Result<(), LlmError> {
        tracing::trace!(events = batch.len(), "export disabled, dropping events");
        Ok(())
    }
}
