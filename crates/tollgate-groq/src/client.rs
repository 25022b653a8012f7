// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an OpenAI-compatible chat-completions API.
//!
//! Provides [`ChatClient`], shared by the worker adapter and the guard-model
//! safety gate. Requests are sent exactly once; failures are reported to the
//! caller without retrying.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tollgate_core::TollgateError;
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Collaborator name used in upstream errors.
const COLLABORATOR: &str = "groq";

/// HTTP client for chat-completions requests.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    /// Creates a client for `{base_url}/chat/completions`.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        timeout: Duration,
    ) -> Result<Self, TollgateError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| TollgateError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TollgateError::Upstream {
                collaborator: COLLABORATOR.into(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a non-streaming completion request and returns the first
    /// choice's text.
    pub async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, TollgateError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TollgateError::Upstream {
                collaborator: COLLABORATOR.into(),
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        let body = response.text().await.map_err(|e| TollgateError::Upstream {
            collaborator: COLLABORATOR.into(),
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("API error ({status}): {}", api_err.error.message),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(TollgateError::upstream(COLLABORATOR, message));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| TollgateError::Upstream {
                collaborator: COLLABORATOR.into(),
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                model = %request.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "token usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TollgateError::upstream(COLLABORATOR, "response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "llama-3.1-8b-instant".into(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: Some(16),
            temperature: None,
        }
    }

    fn client(server: &MockServer) -> ChatClient {
        ChatClient::new(
            &server.uri(),
            &SecretString::from("gsk-test".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer gsk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [{"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(client(&server).complete(&request()).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn api_errors_are_upstream_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"message": "over capacity", "type": "server_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, TollgateError::Upstream { .. }));
        assert!(err.to_string().contains("over capacity"));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = client(&server).complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = ChatClient::new(
            "https://api.groq.com/openai/v1/",
            &SecretString::from("k".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }
}
