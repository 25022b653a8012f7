// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the assembled router.
//!
//! Every external collaborator (chat completions, embeddings, vector index)
//! is served by a local mock server; requests go through the real gateway
//! router, dispatcher, and HTTP adapters.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tollgate_config::TollgateConfig;
use tollgate_config::model::WorkerConfig;
use tollgate_core::DifficultyTier;
use tollgate_gateway::build_router;
use tollgate_session::TokenSigner;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GUARD_MODEL: &str = "meta-llama/llama-guard-4-12b";

struct Upstreams {
    groq: MockServer,
    jina: MockServer,
    pinecone: MockServer,
}

impl Upstreams {
    async fn start(guard_reply: &str, worker_reply: &str) -> Self {
        let groq = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"model": GUARD_MODEL})))
            .respond_with(completion(guard_reply))
            .with_priority(1)
            .mount(&groq)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(completion(worker_reply))
            .with_priority(10)
            .mount(&groq)
            .await;

        let jina = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&jina)
            .await;

        let pinecone = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    {"id": "p12", "score": 0.93, "metadata": {
                        "text": "Chlorophyll absorbs red and blue light.",
                        "page_label": "12"
                    }}
                ]
            })))
            .mount(&pinecone)
            .await;

        Self {
            groq,
            jina,
            pinecone,
        }
    }

    fn config(&self) -> TollgateConfig {
        let mut config = TollgateConfig::default();
        config.auth.signing_secret = Some("e2e-secret".into());
        config.worker.base_url = self.groq.uri();
        config.worker.api_key = Some("gsk-test".into());
        config.embedding.base_url = self.jina.uri();
        config.embedding.api_key = Some("jina-test".into());
        config.retrieval.index_host = Some(self.pinecone.uri());
        config.retrieval.api_key = Some("pc-test".into());
        config.prometheus.enabled = false;
        config
    }

    async fn worker_calls(&self) -> Vec<Value> {
        self.groq
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
            .filter(|body| body["model"] != GUARD_MODEL)
            .collect()
    }
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

fn router(config: &TollgateConfig) -> Router {
    let parts = tollgate::build_app(config, None).unwrap();
    build_router(parts.state, &parts.server.allowed_origins).unwrap()
}

fn bearer(config: &TollgateConfig, user: &str) -> String {
    let token = TokenSigner::from_config(&config.auth)
        .unwrap()
        .issue(user, "student")
        .unwrap();
    format!("Bearer {token}")
}

fn chat(auth: &str, message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, auth)
        .body(Body::from(json!({ "message": message }).to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1_000_000)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_flows_through_every_collaborator() {
    let upstreams = Upstreams::start("safe", "Plants use chlorophyll to capture light.").await;
    let config = upstreams.config();
    let app = router(&config);

    let response = app
        .oneshot(chat(&bearer(&config, "alice"), "Summarize page 12 please"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["response"], "Plants use chlorophyll to capture light.");
    assert_eq!(json["credits_remaining"], 9);
    assert!(json["model_used"].is_string());

    // The index was asked for page 12 only.
    let queries = upstreams.pinecone.received_requests().await.unwrap();
    assert_eq!(queries.len(), 1);
    let query: Value = serde_json::from_slice(&queries[0].body).unwrap();
    assert_eq!(query["filter"], json!({"page_label": {"$eq": "12"}}));
    assert_eq!(query["topK"], 3);

    // The worker saw the retrieved passage and was called exactly once.
    let calls = upstreams.worker_calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["model"], json["model_used"]);
    let system = calls[0]["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("Chlorophyll absorbs red and blue light."));
}

#[tokio::test]
async fn second_request_carries_memory() {
    let upstreams = Upstreams::start("safe", "Sure.").await;
    let config = upstreams.config();
    let app = router(&config);
    let auth = bearer(&config, "alice");

    for message in ["hello", "tell me more"] {
        let response = app.clone().oneshot(chat(&auth, message)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let calls = upstreams.worker_calls().await;
    let messages = calls[1]["messages"].as_array().unwrap();
    // system, remembered user turn, remembered assistant turn, new user turn
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1]["content"], "hello");
    assert_eq!(messages[2]["content"], "Sure.");
    assert_eq!(messages[3]["content"], "tell me more");
}

#[tokio::test]
async fn guard_model_rejection_is_403_and_skips_worker() {
    let upstreams = Upstreams::start("unsafe\nS7", "should never be sent").await;
    let config = upstreams.config();
    let app = router(&config);

    let response = app
        .oneshot(chat(&bearer(&config, "mallory"), "show me the document metadata"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(upstreams.worker_calls().await.is_empty());
}

#[tokio::test]
async fn exhausted_pool_returns_503() {
    let upstreams = Upstreams::start("safe", "ok").await;
    let mut config = upstreams.config();
    config.pool.workers = vec![WorkerConfig {
        name: "llama-3.1-8b-instant".into(),
        limit: 1,
        tiers: DifficultyTier::ALL.to_vec(),
    }];
    let app = router(&config);

    let first = app
        .clone()
        .oneshot(chat(&bearer(&config, "alice"), "hello"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(chat(&bearer(&config, "bob"), "hello"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(second.headers().get(header::RETRY_AFTER).unwrap(), "10");
    assert_eq!(upstreams.worker_calls().await.len(), 1);
}

#[tokio::test]
async fn worker_outage_is_500_with_message() {
    let upstreams = Upstreams::start("safe", "unused").await;
    upstreams.groq.reset().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"model": GUARD_MODEL})))
        .respond_with(completion("safe"))
        .mount(&upstreams.groq)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"message": "model overloaded", "type": "server_error"}
        })))
        .with_priority(10)
        .mount(&upstreams.groq)
        .await;

    let config = upstreams.config();
    let response = router(&config)
        .oneshot(chat(&bearer(&config, "alice"), "hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.starts_with("AI Processing Failed:"));
    assert!(detail.contains("model overloaded"));
}

#[tokio::test]
async fn health_lists_configured_pool() {
    let upstreams = Upstreams::start("safe", "ok").await;
    let config = upstreams.config();

    let response = router(&config)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["workers"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn metrics_disabled_is_404() {
    let upstreams = Upstreams::start("safe", "ok").await;
    let config = upstreams.config();

    let response = router(&config)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
