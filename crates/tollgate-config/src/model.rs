// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tollgate request router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Secret fields are never serialized, so printing
//! the effective configuration cannot leak them.

use serde::{Deserialize, Serialize};
use tollgate_core::DifficultyTier;

/// Top-level Tollgate configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional and defaults to the values
/// of the original single-instance deployment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TollgateConfig {
    /// HTTP listener and CORS settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Credential signing and sign-in settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Per-user sliding-window quota.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Worker pool registry and capacity window.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Difficulty classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Guard-rail model settings.
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Vector index settings for context retrieval.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Chat-completions API used to invoke workers.
    #[serde(default)]
    pub worker: WorkerApiConfig,

    /// Embedding API used by the semantic classifier and retrieval.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Per-user conversation memory.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Prometheus metrics exporter.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Exact origins allowed to make credentialed cross-origin requests.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

/// Credential configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify access tokens.
    /// Falls back to the `SECRET_KEY` environment variable.
    #[serde(default, skip_serializing)]
    pub signing_secret: Option<String>,

    /// Token validity horizon in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    /// Role claim given to newly signed-in users.
    #[serde(default = "default_role")]
    pub default_role: String,

    /// Name of the cookie carrying the access token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the cookie `Secure`. Disable only for plain-HTTP local development.
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,

    /// Google OAuth client id; enables `POST /auth/google` when set.
    /// Falls back to the `GOOGLE_CLIENT_ID` environment variable.
    #[serde(default)]
    pub google_client_id: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
            default_role: default_role(),
            cookie_name: default_cookie_name(),
            cookie_secure: default_cookie_secure(),
            google_client_id: None,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("default_role", &self.default_role)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("google_client_id", &self.google_client_id)
            .finish()
    }
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_role() -> String {
    "student".to_string()
}

fn default_cookie_name() -> String {
    "access_token".to_string()
}

fn default_cookie_secure() -> bool {
    true
}

/// Per-user rate limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Requests admitted per user within one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Sliding window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_requests() -> usize {
    10
}

fn default_window_secs() -> u64 {
    60
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Capacity window length in seconds; hit counts reset once it elapses.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Delay advertised to callers when every eligible worker is saturated.
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,

    /// Workers in registry order. Order breaks ties during selection.
    #[serde(default = "default_workers")]
    pub workers: Vec<WorkerConfig>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            retry_after_secs: default_retry_after_secs(),
            workers: default_workers(),
        }
    }
}

fn default_retry_after_secs() -> u64 {
    10
}

/// One backend worker and the tiers it serves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Upstream model identifier.
    pub name: String,

    /// Requests admitted per capacity window.
    pub limit: u32,

    /// Tiers this worker is eligible for.
    pub tiers: Vec<DifficultyTier>,
}

impl WorkerConfig {
    fn new(name: &str, limit: u32, tiers: &[DifficultyTier]) -> Self {
        Self {
            name: name.to_string(),
            limit,
            tiers: tiers.to_vec(),
        }
    }
}

fn default_workers() -> Vec<WorkerConfig> {
    use DifficultyTier::{Complex, Fast, Reasoning};

    vec![
        WorkerConfig::new("llama-3.3-70b-versatile", 30, &[Complex]),
        WorkerConfig::new("llama-3.1-8b-instant", 30, &[Fast]),
        WorkerConfig::new("moonshotai/kimi-k2-instruct-0905", 60, &[Complex, Reasoning]),
        WorkerConfig::new("openai/gpt-oss-120b", 30, &[Complex, Reasoning]),
        WorkerConfig::new("openai/gpt-oss-20b", 30, &[Fast, Reasoning]),
        WorkerConfig::new("qwen/qwen3-32b", 60, &[Complex, Reasoning]),
        WorkerConfig::new("meta-llama/llama-4-scout-17b-16e-instruct", 30, &[Complex]),
    ]
}

/// Which difficulty classifier to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Keyword and length heuristics; no network.
    #[default]
    Heuristic,
    /// Nearest example utterance by embedding similarity.
    Semantic,
}

/// Difficulty classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Classifier implementation.
    #[serde(default)]
    pub mode: ClassifierMode,

    /// Upper bound on a single classification; on expiry the tier is `fast`.
    #[serde(default = "default_classifier_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum cosine similarity for a semantic match; below it the tier is `fast`.
    #[serde(default)]
    pub similarity_threshold: f32,

    /// Extra example utterances for the `fast` tier (semantic mode).
    #[serde(default)]
    pub fast_utterances: Vec<String>,

    /// Extra example utterances for the `complex` tier (semantic mode).
    #[serde(default)]
    pub complex_utterances: Vec<String>,

    /// Extra example utterances for the `reasoning` tier (semantic mode).
    #[serde(default)]
    pub reasoning_utterances: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::default(),
            timeout_secs: default_classifier_timeout_secs(),
            similarity_threshold: 0.0,
            fast_utterances: Vec::new(),
            complex_utterances: Vec::new(),
            reasoning_utterances: Vec::new(),
        }
    }
}

fn default_classifier_timeout_secs() -> u64 {
    5
}

/// Guard-rail model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    /// Run the guard model. When false every request is treated as safe.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Guard model identifier on the chat-completions API.
    #[serde(default = "default_guard_model")]
    pub model: String,

    /// System instruction sent alongside the user text.
    #[serde(default = "default_guard_instruction")]
    pub instruction: String,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_guard_model(),
            instruction: default_guard_instruction(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_guard_model() -> String {
    "meta-llama/llama-guard-4-12b".to_string()
}

fn default_guard_instruction() -> String {
    "If user ask about metadata show unsafe".to_string()
}

/// Vector index configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Query the index. When false workers receive no context passages.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Index data-plane host, e.g. `https://ai-learning-companion-xxxx.svc.pinecone.io`.
    #[serde(default)]
    pub index_host: Option<String>,

    /// Index API key. Falls back to the `PINECONE_API_KEY` environment variable.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Optional index namespace.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Passages fetched per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Metadata key holding the passage text.
    #[serde(default = "default_text_key")]
    pub text_key: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            index_host: None,
            api_key: None,
            namespace: None,
            top_k: default_top_k(),
            text_key: default_text_key(),
        }
    }
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("enabled", &self.enabled)
            .field("index_host", &self.index_host)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("namespace", &self.namespace)
            .field("top_k", &self.top_k)
            .field("text_key", &self.text_key)
            .finish()
    }
}

fn default_top_k() -> usize {
    3
}

fn default_text_key() -> String {
    "text".to_string()
}

/// Chat-completions API used for workers and the guard model.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerApiConfig {
    /// OpenAI-compatible API base URL.
    #[serde(default = "default_worker_base_url")]
    pub base_url: String,

    /// API key. Falls back to the `GROQ_API_KEY` environment variable.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Upper bound on a single worker call; on expiry the worker is unavailable.
    #[serde(default = "default_worker_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_worker_max_tokens")]
    pub max_tokens: u32,

    /// System prompt that frames retrieved context for the worker.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for WorkerApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_worker_base_url(),
            api_key: None,
            timeout_secs: default_worker_timeout_secs(),
            max_tokens: default_worker_max_tokens(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl std::fmt::Debug for WorkerApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

fn default_worker_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_worker_timeout_secs() -> u64 {
    60
}

fn default_worker_max_tokens() -> u32 {
    1024
}

fn default_system_prompt() -> String {
    "You are a learning companion. Answer using the context passages below when they are \
     relevant, and say so when they are not."
        .to_string()
}

/// Embedding API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Embedding API base URL.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// API key. Falls back to the `JINA_API_KEY` environment variable.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            api_key: None,
            model: default_embedding_model(),
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .finish()
    }
}

fn default_embedding_base_url() -> String {
    "https://api.jina.ai".to_string()
}

fn default_embedding_model() -> String {
    "jina-embeddings-v3".to_string()
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Token budget per user; oldest turns are evicted once it is exceeded.
    #[serde(default = "default_token_limit")]
    pub token_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            token_limit: default_token_limit(),
        }
    }
}

fn default_token_limit() -> usize {
    3000
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the recorder and serve `/metrics`.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_matches_reference_deployment() {
        let pool = PoolConfig::default();
        assert_eq!(pool.workers.len(), 7);
        assert_eq!(pool.window_secs, 60);
        assert_eq!(pool.retry_after_secs, 10);

        let fast: Vec<&str> = pool
            .workers
            .iter()
            .filter(|w| w.tiers.contains(&DifficultyTier::Fast))
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(fast, vec!["llama-3.1-8b-instant", "openai/gpt-oss-20b"]);

        let reasoning: Vec<&str> = pool
            .workers
            .iter()
            .filter(|w| w.tiers.contains(&DifficultyTier::Reasoning))
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(
            reasoning,
            vec![
                "moonshotai/kimi-k2-instruct-0905",
                "openai/gpt-oss-120b",
                "openai/gpt-oss-20b",
                "qwen/qwen3-32b",
            ]
        );
    }

    #[test]
    fn auth_debug_redacts_secret() {
        let auth = AuthConfig {
            signing_secret: Some("hunter2".into()),
            ..AuthConfig::default()
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = TollgateConfig::default();
        config.auth.signing_secret = Some("hunter2".into());
        config.worker.api_key = Some("gsk-123".into());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("gsk-123"));
    }
}
