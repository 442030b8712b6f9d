//! Request and response types for the Messages API.
//!
//! Requests are kept as an open JSON object: whatever the provider accepts is passed
//! through, and the typed setters are only conveniences for building the map.

use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Key holding the conversation in a request
pub const MESSAGES_KEY: &str = "messages";
/// Key holding the model identifier in a request
pub const MODEL_KEY: &str = "model";

/// Open keyword arguments forwarded verbatim to the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionParams(Map<String, Value>);

impl CompletionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model identifier
    pub fn model(self, model: impl Into<String>) -> Self {
        self.with(MODEL_KEY, Value::String(model.into()))
    }

    /// Set the output token limit
    pub fn max_tokens(self, max_tokens: u32) -> Self {
        self.with("max_tokens", json!(max_tokens))
    }

    /// Set the message list
    pub fn messages(self, messages: Vec<Message>) -> Self {
        let messages = messages
            .into_iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();
        self.with(MESSAGES_KEY, Value::Array(messages))
    }

    /// Set an arbitrary key
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for CompletionParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for CompletionParams {
    type Error = LlmError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(LlmError::InvalidInput(format!(
                "completion params must be a JSON object, got {other}"
            ))),
        }
    }
}

/// Conversation message used by the typed builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Reply from `POST /v1/messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    pub usage: Usage,
}

impl MessagesResponse {
    /// Text of the first content block.
    ///
    /// Fails when there is no content or the first block carries no text.
    pub fn first_text(&self) -> Result<&str, LlmError> {
        match self.content.first() {
            Some(ContentBlock::Text { text }) => Ok(text.as_str()),
            Some(other) => Err(LlmError::ParseError(format!(
                "first content block is not text: {}",
                other.kind()
            ))),
            None => Err(LlmError::ParseError(
                "response contained no content blocks".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    Thinking {
        thinking: String,
        #[serde(default)]
        signature: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ContentBlock {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolUse { .. } => "tool_use",
            Self::Thinking { .. } => "thinking",
            Self::Unknown => "unknown",
        }
    }
}

/// Token counts reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

/// Usage counts as reported to the observability backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageDetails(BTreeMap<String, u64>);

impl UsageDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{"input": input, "output": output}`
    pub fn input_output(input: u64, output: u64) -> Self {
        Self::new().with("input", input).with("output", output)
    }

    pub fn with(mut self, key: impl Into<String>, count: u64) -> Self {
        self.0.insert(key.into(), count);
        self
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&Usage> for UsageDetails {
    fn from(usage: &Usage) -> Self {
        Self::input_output(usage.input_tokens, usage.output_tokens)
    }
}
