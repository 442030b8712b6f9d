//! In-memory exporter
//!
//! Keeps every exported event so callers can inspect what would have been sent.

use super::TelemetryExporter;
use crate::error::LlmError;
use crate::observability::events::{IngestionEvent, IngestionEventType};
use std::sync::{Arc, Mutex, PoisonError};

/// Clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct InMemoryExporter {
    events: Arc<Mutex<Vec<IngestionEvent>>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<IngestionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_of(&self, event_type: IngestionEventType) -> Vec<IngestionEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}

#[async_trait::async_trait]
impl TelemetryExporter for InMemoryExporter {
    async fn export(&self, batch: &[IngestionEvent]) -> Result<(), LlmError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(batch);
        Ok(())
    }
}
