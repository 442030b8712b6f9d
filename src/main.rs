//! Runs the traced demo against the live APIs.
//!
//! Credentials come from `ANTHROPIC_API_KEY`, `LANGFUSE_PUBLIC_KEY` and
//! `LANGFUSE_SECRET_KEY`; see the crate README for the remaining variables.

use llm_observe::demo::{run_demo, traced_noop};
use llm_observe::observability::TraceContext;
use llm_observe::providers::AnthropicClient;
use llm_observe::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = telemetry::init_from_env()?;

    let ctx = TraceContext::from_env()?;
    let client = AnthropicClient::from_env()?;

    if let Some(url) = traced_noop(&ctx).await {
        tracing::info!(trace_url = %url, "recorded no-op trace");
    }

    let result = run_demo(&ctx, &client).await;

    if let Err(e) = ctx.shutdown().await {
        tracing::warn!(error = %e, "could not export observations");
    }

    println!("{}", result?);
    Ok(())
}
