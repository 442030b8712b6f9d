//! Anthropic client against a mock HTTP server.

use std::time::Duration;

use llm_observe::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> AnthropicClient {
    AnthropicClient::new(AnthropicConfig::new("test-api-key").with_base_url(server.uri()))
        .expect("client builds")
}

fn request() -> CompletionParams {
    CompletionParams::new()
        .model("claude-3-opus-20240229")
        .max_tokens(1024)
        .messages(vec![Message::user("Hello, Claude")])
}

#[tokio::test]
async fn sends_params_verbatim_with_auth_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-api-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "model": "claude-3-opus-20240229",
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": "Hello, Claude"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_01XFDUDYJgAACzvnptvVoYEL",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Hello! How can I help you today?"}],
            "model": "claude-3-opus-20240229",
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {"input_tokens": 10, "output_tokens": 12}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server).create(&request()).await.unwrap();

    assert_eq!(response.first_text().unwrap(), "Hello! How can I help you today?");
    assert_eq!(response.usage.input_tokens, 10);
    assert_eq!(response.usage.output_tokens, 12);
    assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
}

#[tokio::test]
async fn maps_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&server)
        .await;

    let err = client(&server).create(&request()).await.unwrap_err();
    assert_eq!(
        err,
        LlmError::AuthenticationError("invalid x-api-key".to_string())
    );
}

#[tokio::test]
async fn maps_overloaded_to_529() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        })))
        .mount(&server)
        .await;

    let err = client(&server).create(&request()).await.unwrap_err();
    assert_eq!(err.status_code(), Some(529));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn response_without_usage_is_a_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Hi"}]
        })))
        .mount(&server)
        .await;

    let err = client(&server).create(&request()).await.unwrap_err();
    assert!(matches!(err, LlmError::ParseError(_)));
}

#[tokio::test]
async fn custom_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("anthropic-beta", "prompt-caching-2024-07-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "cached"}],
            "usage": {"input_tokens": 1, "output_tokens": 1, "cache_read_input_tokens": 900}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::new(
        AnthropicConfig::new("test-api-key")
            .with_base_url(server.uri())
            .with_header("anthropic-beta", "prompt-caching-2024-07-31"),
    )
    .unwrap();

    let response = client.create(&request()).await.unwrap();
    assert_eq!(response.usage.cache_read_input_tokens, Some(900));
}

async fn error_for(status: u16, error_type: &str, message: &str) -> LlmError {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "type": "error",
            "error": {"type": error_type, "message": message}
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).create(&request()).await.unwrap_err()
}

#[tokio::test]
async fn maps_permission_error_to_authentication() {
    let err = error_for(
        403,
        "permission_error",
        "Your API key does not have permission to use the specified resource.",
    )
    .await;
    assert_eq!(
        err,
        LlmError::AuthenticationError(
            "Permission denied: Your API key does not have permission to use the specified resource."
                .to_string()
        )
    );
}

#[tokio::test]
async fn maps_invalid_request_to_invalid_input() {
    let err = error_for(400, "invalid_request_error", "max_tokens: Field required").await;
    assert_eq!(
        err,
        LlmError::InvalidInput("max_tokens: Field required".to_string())
    );
}

#[tokio::test]
async fn maps_request_too_large_to_invalid_input() {
    let err = error_for(413, "request_too_large", "Request exceeds the maximum allowed size").await;
    assert_eq!(
        err,
        LlmError::InvalidInput("Request too large: Request exceeds the maximum allowed size".to_string())
    );
}

#[tokio::test]
async fn maps_not_found_error() {
    let err = error_for(404, "not_found_error", "model: claude-9").await;
    assert_eq!(err, LlmError::NotFound("model: claude-9".to_string()));
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn slow_response_is_a_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({
                    "content": [{"type": "text", "text": "late"}],
                    "usage": {"input_tokens": 1, "output_tokens": 1}
                })),
        )
        .mount(&server)
        .await;

    let client = AnthropicClient::new(
        AnthropicConfig::new("test-api-key")
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let err = client.create(&request()).await.unwrap_err();
    assert!(matches!(err, LlmError::TimeoutError(_)), "got {err:?}");
    assert!(err.is_retryable());
}
