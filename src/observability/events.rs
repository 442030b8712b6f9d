//! Observation Events
//!
//! Records for traces and observations, and the Langfuse ingestion payloads they are
//! exported as.

use crate::types::UsageDetails;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kind of observation opened by [`super::TraceContext::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationType {
    #[default]
    Span,
    /// An LLM call; carries model and usage
    Generation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObservationLevel {
    Debug,
    #[default]
    Default,
    Warning,
    Error,
}

/// Partial update applied to the innermost open observation.
///
/// Unset fields leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationUpdate {
    pub name: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub model: Option<String>,
    pub model_parameters: Option<Value>,
    pub metadata: Option<Value>,
    pub usage_details: Option<UsageDetails>,
    pub level: Option<ObservationLevel>,
    pub status_message: Option<String>,
    pub version: Option<String>,
}

impl ObservationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn usage_details(mut self, usage: UsageDetails) -> Self {
        self.usage_details = Some(usage);
        self
    }

    pub fn level(mut self, level: ObservationLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }
}

/// Trace-level attributes set through [`super::TraceContext::update_current_trace`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceUpdate {
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Value>,
    pub public: Option<bool>,
}

impl TraceUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Observation as it is accumulated while open
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub id: String,
    pub trace_id: String,
    pub parent_observation_id: Option<String>,
    pub kind: ObservationType,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub model: Option<String>,
    pub model_parameters: Option<Value>,
    pub metadata: Option<Value>,
    pub usage_details: Option<UsageDetails>,
    pub level: ObservationLevel,
    pub status_message: Option<String>,
    pub version: Option<String>,
}

impl ObservationRecord {
    pub fn open(
        trace_id: String,
        parent_observation_id: Option<String>,
        kind: ObservationType,
        name: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trace_id,
            parent_observation_id,
            kind,
            name,
            start_time: Utc::now(),
            end_time: None,
            input: None,
            output: None,
            model: None,
            model_parameters: None,
            metadata: None,
            usage_details: None,
            level: ObservationLevel::Default,
            status_message: None,
            version: None,
        }
    }

    /// Merge an update; `model` and `usage_details` only stick on generations
    pub fn apply(&mut self, update: ObservationUpdate) {
        let ObservationUpdate {
            name,
            input,
            output,
            model,
            model_parameters,
            metadata,
            usage_details,
            level,
            status_message,
            version,
        } = update;

        if let Some(name) = name {
            self.name = name;
        }
        if input.is_some() {
            self.input = input;
        }
        if output.is_some() {
            self.output = output;
        }
        if metadata.is_some() {
            self.metadata = metadata;
        }
        if let Some(level) = level {
            self.level = level;
        }
        if status_message.is_some() {
            self.status_message = status_message;
        }
        if version.is_some() {
            self.version = version;
        }

        if self.kind == ObservationType::Generation {
            if model.is_some() {
                self.model = model;
            }
            if model_parameters.is_some() {
                self.model_parameters = model_parameters;
            }
            if usage_details.is_some() {
                self.usage_details = usage_details;
            }
        } else if model.is_some() || usage_details.is_some() || model_parameters.is_some() {
            tracing::debug!(
                observation = %self.name,
                "model and usage fields are ignored on span observations"
            );
        }
    }

    pub fn close(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn into_body(self, environment: Option<String>) -> ObservationBody {
        ObservationBody {
            id: self.id,
            trace_id: self.trace_id,
            parent_observation_id: self.parent_observation_id,
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            input: self.input,
            output: self.output,
            metadata: self.metadata,
            level: self.level,
            status_message: self.status_message,
            version: self.version,
            model: self.model,
            model_parameters: self.model_parameters,
            usage_details: self.usage_details,
            environment,
        }
    }
}

/// Trace as accumulated while its root observation is open
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub tags: Vec<String>,
    pub metadata: Option<Value>,
    pub public: Option<bool>,
}

impl TraceRecord {
    pub fn open(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            timestamp: Utc::now(),
            user_id: None,
            session_id: None,
            tags: Vec::new(),
            metadata: None,
            public: None,
        }
    }

    pub fn apply(&mut self, update: TraceUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if update.user_id.is_some() {
            self.user_id = update.user_id;
        }
        if update.session_id.is_some() {
            self.session_id = update.session_id;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if update.metadata.is_some() {
            self.metadata = update.metadata;
        }
        if update.public.is_some() {
            self.public = update.public;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBody {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBody {
    pub id: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_observation_id: Option<String>,
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub level: ObservationLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_parameters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_details: Option<UsageDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngestionEventType {
    TraceCreate,
    SpanCreate,
    GenerationCreate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngestionBody {
    Trace(TraceBody),
    Observation(ObservationBody),
}

/// One entry of a `POST /api/public/ingestion` batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: IngestionEventType,
    pub body: IngestionBody,
}

impl IngestionEvent {
    pub fn trace(body: TraceBody) -> Self {
        Self::wrap(IngestionEventType::TraceCreate, IngestionBody::Trace(body))
    }

    pub fn observation(kind: ObservationType, body: ObservationBody) -> Self {
        let event_type = match kind {
            ObservationType::Span => IngestionEventType::SpanCreate,
            ObservationType::Generation => IngestionEventType::GenerationCreate,
        };
        Self::wrap(event_type, IngestionBody::Observation(body))
    }

    fn wrap(event_type: IngestionEventType, body: IngestionBody) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            body,
        }
    }

    pub fn as_trace(&self) -> Option<&TraceBody> {
        match &self.body {
            IngestionBody::Trace(body) => Some(body),
            IngestionBody::Observation(_) => None,
        }
    }

    pub fn as_observation(&self) -> Option<&ObservationBody> {
        match &self.body {
            IngestionBody::Observation(body) => Some(body),
            IngestionBody::Trace(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn span_ignores_generation_fields() {
        let mut span = ObservationRecord::open(
            "trace-1".into(),
            None,
            ObservationType::Span,
            "main".into(),
        );
        span.apply(
            ObservationUpdate::new()
                .model("claude-3-opus-20240229")
                .usage_details(UsageDetails::input_output(1, 2))
                .input(json!("hello")),
        );

        assert_eq!(span.model, None);
        assert_eq!(span.usage_details, None);
        assert_eq!(span.input, Some(json!("hello")));
    }

    #[test]
    fn generation_body_uses_ingestion_field_names() {
        let mut generation = ObservationRecord::open(
            "trace-1".into(),
            Some("parent-1".into()),
            ObservationType::Generation,
            "anthropic_completion".into(),
        );
        generation.apply(
            ObservationUpdate::new()
                .model("claude-3-opus-20240229")
                .usage_details(UsageDetails::input_output(10, 5)),
        );
        generation.close();

        let event = IngestionEvent::observation(generation.kind, generation.into_body(None));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "generation-create");
        assert_eq!(value["body"]["traceId"], "trace-1");
        assert_eq!(value["body"]["parentObservationId"], "parent-1");
        assert_eq!(value["body"]["usageDetails"], json!({"input": 10, "output": 5}));
        assert_eq!(value["body"]["level"], "DEFAULT");
        assert!(value["body"]["endTime"].is_string());
        assert!(value["body"].get("statusMessage").is_none());
    }

    #[test]
    fn trace_update_replaces_tags() {
        let mut trace = TraceRecord::open("main".into());
        trace.apply(TraceUpdate::new().tags(["demo"]).user_id("u-1"));
        trace.apply(TraceUpdate::new().tags(["prod", "eu"]));

        assert_eq!(trace.tags, vec!["prod".to_string(), "eu".to_string()]);
        assert_eq!(trace.user_id.as_deref(), Some("u-1"));
    }
}
