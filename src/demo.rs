//! The demo flow driven by the binary.

use crate::completion::anthropic_completion;
use crate::error::LlmError;
use crate::observability::{ObserveOptions, TraceContext};
use crate::providers::MessagesApi;
use crate::types::{CompletionParams, Message};
use std::convert::Infallible;

pub const DEMO_MODEL: &str = "claude-3-opus-20240229";
pub const DEMO_MAX_TOKENS: u32 = 1024;
pub const DEMO_PROMPT: &str = "Hello, Claude";

/// Open an observation that does nothing but look up its trace URL
pub async fn traced_noop(ctx: &TraceContext) -> Option<String> {
    let result = ctx
        .observe(ObserveOptions::span("fn"), async {
            Ok::<_, Infallible>(ctx.get_current_trace_url())
        })
        .await;
    match result {
        Ok(url) => url,
        Err(never) => match never {},
    }
}

/// The fixed request sent by [`run_demo`]
pub fn demo_params() -> CompletionParams {
    CompletionParams::new()
        .model(DEMO_MODEL)
        .max_tokens(DEMO_MAX_TOKENS)
        .messages(vec![Message::user(DEMO_PROMPT)])
}

/// Root observation `main` wrapping one traced completion
pub async fn run_demo<C>(ctx: &TraceContext, client: &C) -> Result<String, LlmError>
where
    C: MessagesApi + ?Sized,
{
    ctx.observe(
        ObserveOptions::span("main"),
        anthropic_completion(ctx, client, demo_params()),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn demo_request_is_fixed() {
        assert_eq!(
            demo_params().into_value(),
            json!({
                "model": "claude-3-opus-20240229",
                "max_tokens": 1024,
                "messages": [{"role": "user", "content": "Hello, Claude"}]
            })
        );
    }
}
