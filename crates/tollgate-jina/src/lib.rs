// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding adapter for Tollgate.
//!
//! [`JinaEmbedder`] calls `POST {base}/v1/embeddings` and returns one vector
//! per input text, in input order. It backs both the semantic classifier and
//! the retrieval query vector.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tollgate_config::model::EmbeddingConfig;
use tollgate_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use tollgate_core::{EmbeddingAdapter, PluginAdapter, TollgateError};
use tracing::debug;

const COLLABORATOR: &str = "embedding";

/// Per-call timeout for embedding requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding adapter for Jina-compatible embedding APIs.
pub struct JinaEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl JinaEmbedder {
    pub fn new(base_url: &str, api_key: &SecretString, model: impl Into<String>) -> Result<Self, TollgateError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| TollgateError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TollgateError::Upstream {
                collaborator: COLLABORATOR.into(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/embeddings", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }

    /// Build from the `[embedding]` section. Requires an API key.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, TollgateError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            TollgateError::Config("embedding.api_key (or JINA_API_KEY) is required".into())
        })?;
        Self::new(&config.base_url, &SecretString::from(api_key), config.model.clone())
    }
}

#[async_trait]
impl PluginAdapter for JinaEmbedder {
    fn name(&self) -> &str {
        "jina-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for JinaEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, TollgateError> {
        if input.texts.is_empty() {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
            });
        }

        let body = EmbeddingRequest {
            model: &self.model,
            input: &input.texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| TollgateError::Upstream {
                collaborator: COLLABORATOR.into(),
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, texts = input.texts.len(), "embedding response received");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TollgateError::upstream(
                COLLABORATOR,
                format!("API returned {status}: {text}"),
            ));
        }

        let mut parsed: EmbeddingResponse =
            response.json().await.map_err(|e| TollgateError::Upstream {
                collaborator: COLLABORATOR.into(),
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if parsed.data.len() != input.texts.len() {
            return Err(TollgateError::upstream(
                COLLABORATOR,
                format!(
                    "expected {} embeddings, got {}",
                    input.texts.len(),
                    parsed.data.len()
                ),
            ));
        }

        parsed.data.sort_by_key(|d| d.index);
        Ok(EmbeddingOutput {
            embeddings: parsed.data.into_iter().map(|d| d.embedding).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer) -> JinaEmbedder {
        let config = EmbeddingConfig {
            base_url: server.uri(),
            api_key: Some("jina-test".into()),
            ..EmbeddingConfig::default()
        };
        JinaEmbedder::from_config(&config).unwrap()
    }

    fn input(texts: &[&str]) -> EmbeddingInput {
        EmbeddingInput {
            texts: texts.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn embeddings_are_returned_in_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer jina-test"))
            .and(body_partial_json(serde_json::json!({"model": "jina-embeddings-v3"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = embedder(&server).embed(input(&["a", "b"])).await.unwrap();
        assert_eq!(out.embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn empty_input_skips_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let out = embedder(&server).embed(input(&[])).await.unwrap();
        assert!(out.embeddings.is_empty());
    }

    #[tokio::test]
    async fn http_errors_are_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = embedder(&server).embed(input(&["a"])).await.unwrap_err();
        assert_eq!(err.reason_code(), "upstream_failure");
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})),
            )
            .mount(&server)
            .await;

        let err = embedder(&server).embed(input(&["a"])).await.unwrap_err();
        assert!(err.to_string().contains("expected 1 embeddings"));
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let err = JinaEmbedder::from_config(&EmbeddingConfig::default()).err().unwrap();
        assert!(matches!(err, TollgateError::Config(_)));
    }
}
