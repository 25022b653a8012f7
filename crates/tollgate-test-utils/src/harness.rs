// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end dispatcher testing.
//!
//! `TestHarness` assembles a complete dispatcher with mock collaborators
//! and exposes `send()` to drive the full admission pipeline in tests.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tollgate_config::model::PoolConfig;
use tollgate_core::types::ContextPassage;
use tollgate_core::{DifficultyTier, SafetyVerdict, TollgateError};
use tollgate_dispatch::{Collaborators, Completed, DispatchSettings, Dispatcher};
use tollgate_router::{GuardedClassifier, LoadBalancer, WorkerDescriptor, WorkerRegistry};
use tollgate_session::{RateLimiter, SessionStore, TokenSigner};

use crate::mock_collaborators::{MockRetrieval, MockSafetyGate, StaticClassifier};
use crate::mock_worker::MockWorker;

/// Signing secret used by every harness.
pub const TEST_SECRET: &str = "tollgate-test-secret";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    verdict: SafetyVerdict,
    classifier: Option<StaticClassifier>,
    workers: Option<Vec<WorkerDescriptor>>,
    max_requests: usize,
    token_limit: usize,
    passages: Vec<ContextPassage>,
    worker_delay: Option<Duration>,
    worker_timeout: Duration,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            verdict: SafetyVerdict::Safe,
            classifier: None,
            workers: None,
            max_requests: 10,
            token_limit: 3000,
            passages: Vec::new(),
            worker_delay: None,
            worker_timeout: Duration::from_secs(60),
        }
    }

    /// Queue mock worker responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_safety_verdict(mut self, verdict: SafetyVerdict) -> Self {
        self.verdict = verdict;
        self
    }

    /// Classify every request into `tier`.
    pub fn with_tier(mut self, tier: DifficultyTier) -> Self {
        self.classifier = Some(StaticClassifier::new(tier));
        self
    }

    /// Use a classifier that always fails.
    pub fn with_failing_classifier(mut self) -> Self {
        self.classifier = Some(StaticClassifier::failing());
        self
    }

    /// Replace the default seven-worker pool.
    pub fn with_workers(mut self, workers: Vec<WorkerDescriptor>) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_rate_limit(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests;
        self
    }

    pub fn with_memory_limit(mut self, token_limit: usize) -> Self {
        self.token_limit = token_limit;
        self
    }

    pub fn with_passages(mut self, passages: Vec<ContextPassage>) -> Self {
        self.passages = passages;
        self
    }

    /// Delay each worker reply and cap worker calls at `timeout`.
    pub fn with_slow_worker(mut self, delay: Duration, timeout: Duration) -> Self {
        self.worker_delay = Some(delay);
        self.worker_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<TestHarness, TollgateError> {
        let signer = Arc::new(TokenSigner::new(
            SecretString::from(TEST_SECRET.to_string()),
            chrono::Duration::hours(24),
        )?);
        let sessions = Arc::new(SessionStore::new(
            RateLimiter::new(self.max_requests, Duration::from_secs(60)),
            self.token_limit,
        ));

        let registry = match self.workers {
            Some(workers) => WorkerRegistry::new(workers)?,
            None => WorkerRegistry::from_config(&PoolConfig::default())?,
        };
        let balancer = Arc::new(LoadBalancer::new(
            registry,
            Duration::from_secs(60),
            Duration::from_secs(10),
        ));

        let mut worker = MockWorker::with_responses(self.responses);
        if let Some(delay) = self.worker_delay {
            worker = worker.with_delay(delay);
        }
        let worker = Arc::new(worker);
        let safety = Arc::new(MockSafetyGate::new(self.verdict));
        let classifier = Arc::new(
            self.classifier
                .unwrap_or_else(|| StaticClassifier::new(DifficultyTier::Fast)),
        );
        let retrieval = Arc::new(MockRetrieval::new(self.passages));

        let collaborators = Collaborators {
            safety: Some(safety.clone()),
            classifier: GuardedClassifier::new(classifier.clone(), Duration::from_secs(5)),
            retrieval: Some(retrieval.clone()),
            worker: worker.clone(),
        };

        let dispatcher = Arc::new(Dispatcher::new(
            signer.clone(),
            sessions,
            balancer,
            collaborators,
            DispatchSettings {
                top_k: 3,
                worker_timeout: self.worker_timeout,
            },
        ));

        Ok(TestHarness {
            dispatcher,
            signer,
            worker,
            safety,
            classifier,
            retrieval,
        })
    }
}

/// A complete dispatcher wired to mock collaborators.
pub struct TestHarness {
    pub dispatcher: Arc<Dispatcher>,
    pub signer: Arc<TokenSigner>,
    pub worker: Arc<MockWorker>,
    pub safety: Arc<MockSafetyGate>,
    pub classifier: Arc<StaticClassifier>,
    pub retrieval: Arc<MockRetrieval>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A valid access token for `user_id`.
    pub fn token_for(&self, user_id: &str) -> String {
        match self.signer.issue(user_id, "student") {
            Ok(token) => token,
            Err(e) => panic!("failed to issue test token: {e}"),
        }
    }

    /// Send `message` as `user_id` through the full pipeline.
    pub async fn send(&self, user_id: &str, message: &str) -> Result<Completed, TollgateError> {
        let token = self.token_for(user_id);
        self.dispatcher.dispatch(Some(&token), message).await
    }
}
