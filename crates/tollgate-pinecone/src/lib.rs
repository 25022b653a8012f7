// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector-index retrieval adapter for Tollgate.
//!
//! [`PineconeRetrieval`] embeds the query text through an
//! [`EmbeddingAdapter`] and sends the vector to `POST {host}/query`. A page
//! filter becomes an exact match on the `page_label` metadata field.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tollgate_config::model::RetrievalConfig;
use tollgate_core::types::{
    AdapterType, ContextPassage, EmbeddingInput, HealthStatus, RetrievalQuery,
};
use tollgate_core::{EmbeddingAdapter, PluginAdapter, RetrievalAdapter, TollgateError};
use tracing::debug;

const COLLABORATOR: &str = "retrieval";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata key written by document loaders that serialize whole nodes.
const NODE_CONTENT_KEY: &str = "_node_content";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

/// Build the metadata filter for an optional page label.
pub fn page_filter(page: Option<&str>) -> Option<Value> {
    page.map(|label| json!({"page_label": {"$eq": label}}))
}

/// Retrieval adapter backed by a Pinecone index.
pub struct PineconeRetrieval {
    client: reqwest::Client,
    endpoint: String,
    namespace: Option<String>,
    text_key: String,
    embedder: Arc<dyn EmbeddingAdapter>,
}

impl PineconeRetrieval {
    pub fn new(
        index_host: &str,
        api_key: &SecretString,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, TollgateError> {
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| TollgateError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("Api-Key", key);
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

        let host = index_host.trim_end_matches('/');
        let endpoint = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}/query")
        } else {
            format!("https://{host}/query")
        };

        Ok(Self {
            client,
            endpoint,
            namespace: None,
            text_key: "text".to_string(),
            embedder,
        })
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_text_key(mut self, text_key: impl Into<String>) -> Self {
        self.text_key = text_key.into();
        self
    }

    /// Build from the `[retrieval]` section. Requires a host and an API key.
    pub fn from_config(
        config: &RetrievalConfig,
        embedder: Arc<dyn EmbeddingAdapter>,
    ) -> Result<Self, TollgateError> {
        let host = config
            .index_host
            .as_deref()
            .ok_or_else(|| TollgateError::Config("retrieval.index_host is required".into()))?;
        let api_key = config.api_key.clone().ok_or_else(|| {
            TollgateError::Config("retrieval.api_key (or PINECONE_API_KEY) is required".into())
        })?;
        Ok(Self::new(host, &SecretString::from(api_key), embedder)?
            .with_namespace(config.namespace.clone())
            .with_text_key(config.text_key.clone()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, TollgateError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TollgateError::upstream("embedding", "no embedding returned for query"))
    }

    /// Extract passage text from match metadata.
    fn passage_text(&self, metadata: &Map<String, Value>) -> Option<String> {
        if let Some(Value::String(text)) = metadata.get(&self.text_key) {
            return Some(text.clone());
        }
        // Serialized nodes keep the text inside a JSON string.
        let Value::String(raw) = metadata.get(NODE_CONTENT_KEY)? else {
            return None;
        };
        let node: Value = serde_json::from_str(raw).ok()?;
        node.get("text")?.as_str().map(str::to_string)
    }
}

#[async_trait]
impl PluginAdapter for PineconeRetrieval {
    fn name(&self) -> &str {
        "pinecone"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Retrieval
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl RetrievalAdapter for PineconeRetrieval {
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<ContextPassage>, TollgateError> {
        let vector = self.embed_query(&query.text).await?;

        let body = QueryRequest {
            vector,
            top_k: query.top_k,
            include_metadata: true,
            namespace: self.namespace.as_deref(),
            filter: page_filter(query.page_filter.as_deref()),
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
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TollgateError::upstream(
                COLLABORATOR,
                format!("index returned {status}: {text}"),
            ));
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| TollgateError::Upstream {
            collaborator: COLLABORATOR.into(),
            message: format!("failed to parse index response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let passages: Vec<ContextPassage> = parsed
            .matches
            .into_iter()
            .filter_map(|m| {
                let metadata = m.metadata?;
                let text = self.passage_text(&metadata)?;
                let page_label = match metadata.get("page_label") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                };
                Some(ContextPassage {
                    text,
                    score: m.score,
                    page_label,
                })
            })
            .collect();

        debug!(
            passages = passages.len(),
            page_filter = ?query.page_filter,
            "retrieval complete"
        );
        Ok(passages)
    }
}
