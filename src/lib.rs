//! # llm-observe
//!
//! Trace Anthropic Messages API calls as Langfuse generations and report their token usage.
//!
//! ```rust,no_run
//! use llm_observe::prelude::*;
//!
//! # async fn example() -> Result<(), LlmError> {
//! let ctx = TraceContext::from_env()?;
//! let client = AnthropicClient::from_env()?;
//!
//! let params = CompletionParams::new()
//!     .model("claude-3-opus-20240229")
//!     .max_tokens(1024)
//!     .messages(vec![Message::user("Hello, Claude")]);
//!
//! let text = ctx
//!     .observe(ObserveOptions::span("main"), anthropic_completion(&ctx, &client, params))
//!     .await?;
//! println!("{text}");
//! ctx.flush().await?;
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod demo;
pub mod error;
pub mod observability;
pub mod providers;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use completion::anthropic_completion;
pub use error::LlmError;

pub mod prelude {
    pub use crate::completion::anthropic_completion;
    pub use crate::error::LlmError;
    pub use crate::observability::{
        InMemoryExporter, LangfuseConfig, ObservationUpdate, ObserveOptions, TraceContext,
        TraceUpdate,
    };
    pub use crate::providers::{AnthropicClient, AnthropicConfig, MessagesApi};
    pub use crate::types::{CompletionParams, Message, MessagesResponse, UsageDetails};
}
