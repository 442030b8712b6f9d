//! Traced completion call.

use crate::error::LlmError;
use crate::observability::{ObservationUpdate, ObserveOptions, TraceContext};
use crate::providers::MessagesApi;
use crate::types::{CompletionParams, MESSAGES_KEY, MODEL_KEY, UsageDetails};
use serde_json::Value;

/// Name of the generation observation opened by [`anthropic_completion`]
pub const COMPLETION_OBSERVATION: &str = "anthropic_completion";

/// Call `messages.create` inside a generation observation and return the first text block.
///
/// `messages` and `model` are reported as the observation's input and model, every other
/// key as metadata. The provider receives `params` untouched. Provider errors are returned
/// as-is after being recorded on the observation.
pub async fn anthropic_completion<C>(
    ctx: &TraceContext,
    client: &C,
    params: CompletionParams,
) -> Result<String, LlmError>
where
    C: MessagesApi + ?Sized,
{
    ctx.observe(ObserveOptions::generation(COMPLETION_OBSERVATION), async {
        ctx.update_current_observation(pre_call_update(&params));

        let response = client.create(&params).await?;

        ctx.update_current_observation(
            ObservationUpdate::new().usage_details(UsageDetails::from(&response.usage)),
        );
        response.first_text().map(str::to_owned)
    })
    .await
}

/// Input, model and metadata reported before the call
fn pre_call_update(params: &CompletionParams) -> ObservationUpdate {
    let mut metadata = params.clone();
    let input = metadata.remove(MESSAGES_KEY);
    let model = metadata.remove(MODEL_KEY).map(|model| match model {
        Value::String(name) => name,
        other => other.to_string(),
    });

    ObservationUpdate {
        input,
        model,
        metadata: Some(metadata.into_value()),
        ..ObservationUpdate::default()
    }
}
