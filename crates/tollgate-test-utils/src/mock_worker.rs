// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock worker adapter for deterministic testing.
//!
//! `MockWorker` implements `WorkerAdapter` with pre-configured responses
//! and records every request it receives.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tollgate_core::types::{AdapterType, HealthStatus, WorkerRequest};
use tollgate_core::{PluginAdapter, TollgateError, WorkerAdapter};

/// A mock worker that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty the
/// reply is `"mock response from <worker>"`.
pub struct MockWorker {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<WorkerRequest>>,
    failure: Mutex<Option<String>>,
    delay: Option<Duration>,
}

impl MockWorker {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a mock worker pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            delay: None,
        }
    }

    /// Sleep this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// Make every subsequent call fail with `message`.
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().await = Some(message.into());
    }

    /// Requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<WorkerRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn invocations(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockWorker {
    fn name(&self) -> &str {
        "mock-worker"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Worker
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl WorkerAdapter for MockWorker {
    async fn invoke(&self, request: WorkerRequest) -> Result<String, TollgateError> {
        let worker = request.worker.clone();
        self.requests.lock().await.push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failure.lock().await.clone() {
            return Err(TollgateError::upstream("worker", message));
        }

        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| format!("mock response from {worker}")))
    }
}
