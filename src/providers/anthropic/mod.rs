//! Anthropic Messages API
//!
//! The completion wrapper only depends on [`MessagesApi`]; [`AnthropicClient`] is the
//! HTTP implementation used by the binary.

mod client;
mod config;
mod errors;

pub use client::AnthropicClient;
pub use config::{ANTHROPIC_VERSION, AnthropicConfig, DEFAULT_BASE_URL};
pub use errors::parse_error_body;

use crate::error::LlmError;
use crate::types::{CompletionParams, MessagesResponse};
use async_trait::async_trait;

/// Provider seam for `messages.create(**kwargs)`
#[async_trait]
pub trait MessagesApi: Send + Sync {
    /// Send `params` unchanged and decode the reply
    async fn create(&self, params: &CompletionParams) -> Result<MessagesResponse, LlmError>;
}

#[async_trait]
impl<T: MessagesApi + ?Sized> MessagesApi for std::sync::Arc<T> {
    async fn create(&self, params: &CompletionParams) -> Result<MessagesResponse, LlmError> {
        (**self).create(params).await
    }
}
