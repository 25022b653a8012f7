// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate serve` implementation.
//!
//! Builds the collaborators named in the configuration, assembles the
//! dispatcher, and serves the HTTP gateway until a shutdown signal arrives.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tollgate_config::TollgateConfig;
use tollgate_config::model::ClassifierMode;
use tollgate_core::{
    DifficultyClassifier, EmbeddingAdapter, IdentityProvider, RetrievalAdapter, SafetyGate,
    TollgateError, WorkerAdapter,
};
use tollgate_dispatch::{Collaborators, DispatchSettings, Dispatcher};
use tollgate_gateway::{
    CookieSettings, GatewayState, GoogleIdentityProvider, HealthState, ServerConfig, start_server,
};
use tollgate_groq::{GroqWorker, GuardModelSafetyGate};
use tollgate_jina::JinaEmbedder;
use tollgate_pinecone::PineconeRetrieval;
use tollgate_prometheus::PrometheusAdapter;
use tollgate_router::{GuardedClassifier, HeuristicClassifier, LoadBalancer, SemanticClassifier};
use tollgate_session::{SessionStore, TokenSigner};
use tracing::info;

use crate::shutdown;

/// Everything needed to start the gateway.
pub struct AppParts {
    pub state: GatewayState,
    pub server: ServerConfig,
}

/// Assemble the dispatcher and gateway state from configuration.
///
/// Fails with `TollgateError::Config` when a collaborator the configuration
/// enables is missing its endpoint or API key.
pub fn build_app(
    config: &TollgateConfig,
    prometheus: Option<Arc<PrometheusAdapter>>,
) -> Result<AppParts, TollgateError> {
    let signer = Arc::new(TokenSigner::from_config(&config.auth)?);
    let sessions = Arc::new(SessionStore::from_config(config));
    let balancer = Arc::new(LoadBalancer::from_config(&config.pool)?);

    let mut embedder: Option<Arc<dyn EmbeddingAdapter>> = None;

    let worker: Arc<dyn WorkerAdapter> = Arc::new(GroqWorker::from_config(&config.worker)?);

    let safety: Option<Arc<dyn SafetyGate>> = if config.safety.enabled {
        Some(Arc::new(GuardModelSafetyGate::from_config(config)?))
    } else {
        None
    };

    let classifier: Arc<dyn DifficultyClassifier> = match config.classifier.mode {
        ClassifierMode::Heuristic => Arc::new(HeuristicClassifier::new()),
        ClassifierMode::Semantic => Arc::new(SemanticClassifier::from_config(
            &config.classifier,
            shared_embedder(config, &mut embedder)?,
        )),
    };
    let classifier =
        GuardedClassifier::new(classifier, Duration::from_secs(config.classifier.timeout_secs));

    let retrieval: Option<Arc<dyn RetrievalAdapter>> = if config.retrieval.enabled {
        Some(Arc::new(PineconeRetrieval::from_config(
            &config.retrieval,
            shared_embedder(config, &mut embedder)?,
        )?))
    } else {
        None
    };

    let identity: Option<Arc<dyn IdentityProvider>> = match &config.auth.google_client_id {
        Some(client_id) => Some(Arc::new(GoogleIdentityProvider::new(client_id.clone())?)),
        None => None,
    };

    if prometheus.is_some() {
        for descriptor in balancer.registry().workers() {
            tollgate_prometheus::set_worker_remaining(&descriptor.name, descriptor.window_limit);
        }
    }

    let dispatcher = Arc::new(Dispatcher::new(
        signer,
        sessions,
        balancer,
        Collaborators {
            safety,
            classifier,
            retrieval,
            worker,
        },
        DispatchSettings::from_config(config),
    ));

    let prometheus_render = prometheus.map(|adapter| {
        Arc::new(move || adapter.render()) as Arc<dyn Fn() -> String + Send + Sync>
    });

    Ok(AppParts {
        state: GatewayState {
            dispatcher,
            identity,
            cookie: CookieSettings::from_config(&config.auth),
            default_role: config.auth.default_role.clone(),
            health: HealthState {
                start_time: Instant::now(),
                prometheus_render,
            },
        },
        server: ServerConfig {
            host: config.server.host.clone(),
            port: config.server.port,
            allowed_origins: config.server.allowed_origins.clone(),
        },
    })
}

/// The embedding adapter, built on first use and shared afterwards.
fn shared_embedder(
    config: &TollgateConfig,
    slot: &mut Option<Arc<dyn EmbeddingAdapter>>,
) -> Result<Arc<dyn EmbeddingAdapter>, TollgateError> {
    if let Some(embedder) = slot {
        return Ok(embedder.clone());
    }
    let embedder: Arc<dyn EmbeddingAdapter> = Arc::new(JinaEmbedder::from_config(&config.embedding)?);
    *slot = Some(embedder.clone());
    Ok(embedder)
}

/// Run the router until SIGINT or SIGTERM.
pub async fn run_serve(config: TollgateConfig) -> Result<(), TollgateError> {
    init_tracing(&config.server.log_level);

    let prometheus = if config.prometheus.enabled {
        Some(Arc::new(PrometheusAdapter::new()?))
    } else {
        None
    };

    let parts = build_app(&config, prometheus)?;
    info!(
        workers = config.pool.workers.len(),
        classifier = ?config.classifier.mode,
        safety = config.safety.enabled,
        retrieval = config.retrieval.enabled,
        google_sign_in = parts.state.identity.is_some(),
        "tollgate configured"
    );

    let cancel = shutdown::install_signal_handler();
    start_server(&parts.server, parts.state, cancel).await?;

    info!("tollgate serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tollgate={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
