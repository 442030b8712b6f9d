//! Trace Context
//!
//! An explicit handle standing in for an ambient "current trace". Work wrapped in
//! [`TraceContext::observe`] becomes an observation; the first one opened on an idle context
//! starts a new trace and every observation opened while it runs is nested under it.
//!
//! ```rust
//! use llm_observe::observability::{InMemoryExporter, LangfuseConfig, ObserveOptions, TraceContext};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), llm_observe::error::LlmError> {
//! let ctx = TraceContext::new(LangfuseConfig::default(), Arc::new(InMemoryExporter::new()));
//! let url = ctx
//!     .observe(ObserveOptions::span("lookup"), async {
//!         Ok::<_, llm_observe::error::LlmError>(ctx.get_current_trace_url())
//!     })
//!     .await?;
//! assert!(url.is_some());
//! ctx.flush().await?;
//! # Ok(())
//! # }
//! ```
//!
//! A context tracks one stack of open observations; it is meant to be driven by one task
//! at a time.

use crate::error::LlmError;
use crate::observability::config::LangfuseConfig;
use crate::observability::events::{
    IngestionEvent, ObservationLevel, ObservationRecord, ObservationType, ObservationUpdate,
    TraceBody, TraceRecord, TraceUpdate,
};
use crate::observability::exporters::{LangfuseExporter, NoopExporter, TelemetryExporter};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{Instrument, debug, warn};

/// How an observation is opened
#[derive(Debug, Clone, PartialEq)]
pub struct ObserveOptions {
    pub name: String,
    pub kind: ObservationType,
    /// Record the `Ok` value as output when no update set one
    pub capture_output: bool,
    pub input: Option<Value>,
}

impl ObserveOptions {
    pub fn span(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObservationType::Span,
            capture_output: true,
            input: None,
        }
    }

    pub fn generation(name: impl Into<String>) -> Self {
        Self {
            kind: ObservationType::Generation,
            ..Self::span(name)
        }
    }

    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }
}

#[derive(Debug, Default)]
struct ContextState {
    trace: Option<TraceRecord>,
    stack: Vec<ObservationRecord>,
    pending: Vec<IngestionEvent>,
}

enum Outcome {
    Completed(Option<Value>),
    Failed(String),
    Cancelled,
}

pub struct TraceContext {
    config: LangfuseConfig,
    exporter: Arc<dyn TelemetryExporter>,
    state: Mutex<ContextState>,
}

impl std::fmt::Debug for TraceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("TraceContext")
            .field("host", &self.config.host)
            .field("trace_id", &state.trace.as_ref().map(|t| &t.id))
            .field("open_observations", &state.stack.len())
            .field("pending_events", &state.pending.len())
            .finish()
    }
}

impl TraceContext {
    pub fn new(config: LangfuseConfig, exporter: Arc<dyn TelemetryExporter>) -> Self {
        Self {
            config,
            exporter,
            state: Mutex::new(ContextState::default()),
        }
    }

    /// Export to Langfuse when keys are configured, otherwise drop events
    pub fn from_config(config: LangfuseConfig) -> Result<Self, LlmError> {
        let exporter: Arc<dyn TelemetryExporter> = if config.is_exportable() {
            Arc::new(LangfuseExporter::new(config.clone())?)
        } else {
            if config.enabled {
                warn!("Langfuse keys are not configured; observations will not be exported");
            }
            Arc::new(NoopExporter)
        };
        Ok(Self::new(config, exporter))
    }

    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(LangfuseConfig::from_env())
    }

    pub const fn config(&self) -> &LangfuseConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `work` as an observation.
    ///
    /// The result is returned unchanged. Errors close the observation with level `ERROR`
    /// and their message as status; a future dropped before completion is closed with
    /// level `WARNING`.
    pub async fn observe<F, T, E>(&self, options: ObserveOptions, work: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        let capture_output = options.capture_output;
        let kind = options.kind;
        let name = options.name.clone();
        let (trace_id, observation_id) = self.enter(options);

        let mut guard = ObservationGuard {
            ctx: self,
            observation_id: observation_id.clone(),
            armed: true,
        };

        let span = tracing::info_span!(
            "observation",
            name = %name,
            kind = ?kind,
            trace_id = %trace_id,
            observation_id = %observation_id,
        );
        let result = work.instrument(span).await;

        let outcome = match &result {
            Ok(value) if capture_output => Outcome::Completed(
                serde_json::to_value(value).ok().filter(|v| !v.is_null()),
            ),
            Ok(_) => Outcome::Completed(None),
            Err(e) => Outcome::Failed(e.to_string()),
        };
        guard.armed = false;
        self.exit(&observation_id, outcome);
        result
    }

    fn enter(&self, options: ObserveOptions) -> (String, String) {
        let mut state = self.state();
        let existing = state.trace.as_ref().map(|t| t.id.clone());
        let trace_id = match existing {
            Some(id) => id,
            None => {
                let trace = TraceRecord::open(options.name.clone());
                let id = trace.id.clone();
                debug!(trace_id = %id, name = %options.name, "trace started");
                state.trace = Some(trace);
                id
            }
        };
        let parent = state.stack.last().map(|o| o.id.clone());

        let mut record = ObservationRecord::open(trace_id.clone(), parent, options.kind, options.name);
        record.input = options.input;
        let observation_id = record.id.clone();
        state.stack.push(record);
        (trace_id, observation_id)
    }

    fn exit(&self, observation_id: &str, outcome: Outcome) {
        let mut state = self.state();
        let Some(position) = state.stack.iter().rposition(|o| o.id == observation_id) else {
            warn!(observation_id, "observation already closed");
            return;
        };
        if position + 1 != state.stack.len() {
            warn!(
                observation_id,
                "closing an observation that still has open children"
            );
        }
        let mut record = state.stack.remove(position);

        match outcome {
            Outcome::Completed(output) => {
                if record.output.is_none() {
                    record.output = output;
                }
            }
            Outcome::Failed(message) => {
                record.level = ObservationLevel::Error;
                if record.status_message.is_none() {
                    record.status_message = Some(message);
                }
            }
            Outcome::Cancelled => {
                record.level = ObservationLevel::Warning;
                if record.status_message.is_none() {
                    record.status_message =
                        Some("observation dropped before completion".to_string());
                }
            }
        }
        record.close();

        let root = state.stack.is_empty();
        let trace_event = if root {
            state.trace.take().map(|trace| {
                IngestionEvent::trace(TraceBody {
                    id: trace.id,
                    timestamp: trace.timestamp,
                    name: trace.name,
                    input: record.input.clone(),
                    output: record.output.clone(),
                    metadata: trace.metadata,
                    user_id: trace.user_id,
                    session_id: trace.session_id,
                    tags: trace.tags,
                    public: trace.public,
                    release: self.config.release.clone(),
                    environment: self.config.environment.clone(),
                })
            })
        } else {
            None
        };

        debug!(
            observation_id,
            name = %record.name,
            level = ?record.level,
            root,
            "observation closed"
        );
        let kind = record.kind;
        state.pending.push(IngestionEvent::observation(
            kind,
            record.into_body(self.config.environment.clone()),
        ));
        if let Some(event) = trace_event {
            state.pending.push(event);
        }
    }

    /// Merge `update` into the innermost open observation.
    ///
    /// Outside of any observation the update is dropped with a warning.
    pub fn update_current_observation(&self, update: ObservationUpdate) {
        let mut state = self.state();
        match state.stack.last_mut() {
            Some(current) => current.apply(update),
            None => warn!("No active observation; update_current_observation ignored"),
        }
    }

    pub fn update_current_trace(&self, update: TraceUpdate) {
        let mut state = self.state();
        match state.trace.as_mut() {
            Some(trace) => trace.apply(update),
            None => warn!("No active trace; update_current_trace ignored"),
        }
    }

    pub fn get_current_trace_id(&self) -> Option<String> {
        self.state().trace.as_ref().map(|t| t.id.clone())
    }

    pub fn get_current_observation_id(&self) -> Option<String> {
        self.state().stack.last().map(|o| o.id.clone())
    }

    /// Link to the active trace in the Langfuse UI
    pub fn get_current_trace_url(&self) -> Option<String> {
        self.get_current_trace_id()
            .map(|trace_id| self.config.trace_url(&trace_id))
    }

    /// Events closed but not yet exported
    pub fn pending_events(&self) -> Vec<IngestionEvent> {
        self.state().pending.clone()
    }

    /// Export every closed observation. Events are dropped if the export fails.
    pub async fn flush(&self) -> Result<(), LlmError> {
        let batch = std::mem::take(&mut self.state().pending);
        if batch.is_empty() {
            return Ok(());
        }

        debug!(events = batch.len(), "flushing observations");
        if let Err(e) = self.exporter.export(&batch).await {
            warn!(dropped = batch.len(), error = %e, "failed to export observations");
            return Err(e);
        }
        self.exporter.flush().await
    }

    /// Flush, then shut the exporter down even if the flush failed.
    ///
    /// The first error is returned.
    pub async fn shutdown(&self) -> Result<(), LlmError> {
        let flushed = self.flush().await;
        let closed = self.exporter.shutdown().await;
        flushed.and(closed)
    }
}

impl Drop for TraceContext {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !state.pending.is_empty() {
            warn!(
                events = state.pending.len(),
                "trace context dropped with unflushed observations"
            );
        }
    }
}

/// Closes the observation if the wrapped future is dropped mid-flight
struct ObservationGuard<'a> {
    ctx: &'a TraceContext,
    observation_id: String,
    armed: bool,
}

impl Drop for ObservationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.ctx.exit(&self.observation_id, Outcome::Cancelled);
        }
    }
}
