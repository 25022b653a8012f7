// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request admission pipeline.
//!
//! Every chat request walks the same states:
//! Received -> Authenticated -> RateChecked -> SafetyChecked -> Classified
//! -> Dispatched -> Completed. Any failure moves it to Rejected with the
//! error's reason code. Nothing is retried and the worker is invoked at
//! most once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tollgate_config::TollgateConfig;
use tollgate_core::types::{RetrievalQuery, WorkerRequest};
use tollgate_core::{
    RetrievalAdapter, SafetyGate, SafetyVerdict, TollgateError, WorkerAdapter,
};
use tollgate_router::{GuardedClassifier, LoadBalancer, WorkerCapacity};
use tollgate_session::{SessionStore, TokenSigner};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::page::extract_page_filter;

/// States in the dispatch FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Authenticated,
    RateChecked,
    SafetyChecked,
    Classified,
    Dispatched,
    Completed,
    /// Terminal failure, carrying the error's reason code.
    Rejected(&'static str),
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchState::Received => write!(f, "received"),
            DispatchState::Authenticated => write!(f, "authenticated"),
            DispatchState::RateChecked => write!(f, "rate_checked"),
            DispatchState::SafetyChecked => write!(f, "safety_checked"),
            DispatchState::Classified => write!(f, "classified"),
            DispatchState::Dispatched => write!(f, "dispatched"),
            DispatchState::Completed => write!(f, "completed"),
            DispatchState::Rejected(reason) => write!(f, "rejected({reason})"),
        }
    }
}

/// Successful dispatch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// The worker's reply.
    pub response: String,
    /// Registry name of the worker that produced it.
    pub worker: String,
    /// Requests the user has left in the current rate window, read when
    /// the reply is ready.
    pub credits_remaining: usize,
}

/// Runtime knobs for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Passages requested from the retrieval index.
    pub top_k: usize,
    /// Upper bound on a single worker call.
    pub worker_timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            worker_timeout: Duration::from_secs(60),
        }
    }
}

impl DispatchSettings {
    pub fn from_config(config: &TollgateConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            worker_timeout: Duration::from_secs(config.worker.timeout_secs),
        }
    }
}

/// External collaborators the dispatcher calls out to.
pub struct Collaborators {
    /// Guard model; `None` treats every request as safe.
    pub safety: Option<Arc<dyn SafetyGate>>,
    pub classifier: GuardedClassifier,
    /// Context source; `None` sends workers no passages.
    pub retrieval: Option<Arc<dyn RetrievalAdapter>>,
    pub worker: Arc<dyn WorkerAdapter>,
}

/// Tracks one request through the FSM and logs each transition.
struct Transitions {
    request_id: Uuid,
    state: DispatchState,
}

impl Transitions {
    fn start() -> Self {
        let request_id = Uuid::new_v4();
        debug!(%request_id, state = %DispatchState::Received, "request received");
        Self {
            request_id,
            state: DispatchState::Received,
        }
    }

    fn advance(&mut self, next: DispatchState) {
        debug!(request_id = %self.request_id, from = %self.state, to = %next, "dispatch transition");
        self.state = next;
    }

    fn reject(&mut self, err: &TollgateError) {
        let reason = err.reason_code();
        info!(
            request_id = %self.request_id,
            from = %self.state,
            reason,
            error = %err,
            "request rejected"
        );
        self.state = DispatchState::Rejected(reason);
    }
}

/// Owns the shared admission state and drives requests through the FSM.
pub struct Dispatcher {
    signer: Arc<TokenSigner>,
    sessions: Arc<SessionStore>,
    balancer: Arc<LoadBalancer>,
    collaborators: Collaborators,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        signer: Arc<TokenSigner>,
        sessions: Arc<SessionStore>,
        balancer: Arc<LoadBalancer>,
        collaborators: Collaborators,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            signer,
            sessions,
            balancer,
            collaborators,
            settings,
        }
    }

    pub fn signer(&self) -> &Arc<TokenSigner> {
        &self.signer
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn balancer(&self) -> &Arc<LoadBalancer> {
        &self.balancer
    }

    /// Current hit counts for `/health` and metrics.
    pub async fn capacity_snapshot(&self) -> Vec<WorkerCapacity> {
        self.balancer.capacity_snapshot().await
    }

    /// Run one chat request end to end.
    ///
    /// `credential` is the raw access token, if the caller presented one.
    pub async fn dispatch(
        &self,
        credential: Option<&str>,
        message: &str,
    ) -> Result<Completed, TollgateError> {
        let started = Instant::now();
        let mut fsm = Transitions::start();

        let result = self.run(&mut fsm, credential, message).await;

        tollgate_prometheus::record_latency(started.elapsed().as_secs_f64());
        match &result {
            Ok(done) => {
                fsm.advance(DispatchState::Completed);
                info!(
                    request_id = %fsm.request_id,
                    worker = %done.worker,
                    credits_remaining = done.credits_remaining,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                tollgate_prometheus::record_request("completed");
            }
            Err(err) => {
                fsm.reject(err);
                tollgate_prometheus::record_request(err.reason_code());
            }
        }
        result
    }

    async fn run(
        &self,
        fsm: &mut Transitions,
        credential: Option<&str>,
        message: &str,
    ) -> Result<Completed, TollgateError> {
        let identity = self.signer.verify_credential(credential)?;
        let user_id = identity.subject;
        fsm.advance(DispatchState::Authenticated);

        // The request is charged before the safety check, so rejected
        // requests still consume quota.
        let remaining = self.sessions.check_and_record_usage(&user_id)?;
        debug!(request_id = %fsm.request_id, remaining, "quota charged");
        fsm.advance(DispatchState::RateChecked);

        if let Some(gate) = &self.collaborators.safety {
            let verdict = gate
                .evaluate(message)
                .await
                .map_err(|e| into_upstream("safety gate", e))?;
            if verdict == SafetyVerdict::Unsafe {
                warn!(request_id = %fsm.request_id, user_id = %user_id, "guard model flagged request");
                return Err(TollgateError::ContentRejected);
            }
        }
        fsm.advance(DispatchState::SafetyChecked);

        let tier = self.collaborators.classifier.classify_or_fast(message).await;
        debug!(request_id = %fsm.request_id, %tier, "request classified");
        fsm.advance(DispatchState::Classified);

        let selection = self.balancer.select_worker(tier).await?;
        tollgate_prometheus::record_selection(
            &selection.worker,
            &tier.to_string(),
            selection.remaining,
        );
        fsm.advance(DispatchState::Dispatched);

        let context = match &self.collaborators.retrieval {
            Some(retrieval) => {
                let query = RetrievalQuery {
                    text: message.to_string(),
                    page_filter: extract_page_filter(message),
                    top_k: self.settings.top_k,
                };
                retrieval
                    .retrieve(&query)
                    .await
                    .map_err(|e| into_upstream("retrieval", e))?
            }
            None => Vec::new(),
        };

        let memory = self.sessions.get_or_create_memory(&user_id);
        let snapshot = memory.lock().await.snapshot();

        let request = WorkerRequest {
            worker: selection.worker.clone(),
            query: message.to_string(),
            context,
            memory: snapshot,
        };

        let response = match tokio::time::timeout(
            self.settings.worker_timeout,
            self.collaborators.worker.invoke(request),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(into_worker_error(&selection.worker, e)),
            Err(_) => {
                return Err(TollgateError::WorkerUnavailable {
                    worker: selection.worker,
                    message: format!(
                        "no response within {}s",
                        self.settings.worker_timeout.as_secs()
                    ),
                });
            }
        };

        memory.lock().await.record_exchange(message, &response);

        Ok(Completed {
            response,
            worker: selection.worker,
            credits_remaining: self.sessions.remaining_quota(&user_id),
        })
    }
}

/// Map a collaborator failure onto `Upstream`, keeping its message.
fn into_upstream(collaborator: &str, err: TollgateError) -> TollgateError {
    match err {
        TollgateError::Upstream { .. } | TollgateError::WorkerUnavailable { .. } => err,
        other => TollgateError::Upstream {
            collaborator: collaborator.to_string(),
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

fn into_worker_error(worker: &str, err: TollgateError) -> TollgateError {
    match err {
        TollgateError::Upstream { .. } | TollgateError::WorkerUnavailable { .. } => err,
        other => TollgateError::WorkerUnavailable {
            worker: worker.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_display() {
        assert_eq!(DispatchState::RateChecked.to_string(), "rate_checked");
        assert_eq!(
            DispatchState::Rejected("capacity_exhausted").to_string(),
            "rejected(capacity_exhausted)"
        );
    }

    #[test]
    fn into_upstream_preserves_message() {
        let err = into_upstream("retrieval", TollgateError::Internal("index gone".into()));
        match err {
            TollgateError::Upstream {
                collaborator,
                message,
                source,
            } => {
                assert_eq!(collaborator, "retrieval");
                assert!(message.contains("index gone"));
                assert!(source.is_some());
            }
            other => panic!("expected Upstream, got {other:?}"),
        }

        let passthrough = into_upstream("x", TollgateError::upstream("pinecone", "HTTP 500"));
        assert_eq!(passthrough.to_string(), "pinecone error: HTTP 500");
    }

    #[test]
    fn worker_errors_name_the_worker() {
        let err = into_worker_error("qwen/qwen3-32b", TollgateError::Internal("boom".into()));
        assert!(matches!(
            err,
            TollgateError::WorkerUnavailable { ref worker, .. } if worker == "qwen/qwen3-32b"
        ));
    }
}
