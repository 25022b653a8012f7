// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable safety gate, classifier, retrieval, and identity mocks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tollgate_core::types::{
    AdapterType, ContextPassage, ExternalIdentity, HealthStatus, RetrievalQuery,
};
use tollgate_core::{
    AuthFailure, DifficultyClassifier, DifficultyTier, IdentityProvider, PluginAdapter,
    RetrievalAdapter, SafetyGate, SafetyVerdict, TollgateError,
};

macro_rules! mock_adapter {
    ($ty:ty, $name:literal, $kind:expr) => {
        #[async_trait]
        impl PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> AdapterType {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
                Ok(HealthStatus::Healthy)
            }
        }
    };
}

/// Safety gate returning a fixed verdict (or error) and counting calls.
pub struct MockSafetyGate {
    verdict: Mutex<Result<SafetyVerdict, String>>,
    calls: AtomicUsize,
}

impl MockSafetyGate {
    pub fn new(verdict: SafetyVerdict) -> Self {
        Self {
            verdict: Mutex::new(Ok(verdict)),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_verdict(&self, verdict: SafetyVerdict) {
        *self.verdict.lock().await = Ok(verdict);
    }

    /// Make every subsequent evaluation fail with `message`.
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.verdict.lock().await = Err(message.into());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

mock_adapter!(MockSafetyGate, "mock-safety", AdapterType::Safety);

#[async_trait]
impl SafetyGate for MockSafetyGate {
    async fn evaluate(&self, _text: &str) -> Result<SafetyVerdict, TollgateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
            .lock()
            .await
            .clone()
            .map_err(|message| TollgateError::upstream("safety gate", message))
    }
}

/// Classifier returning a fixed tier, or failing when none is set.
pub struct StaticClassifier {
    tier: Mutex<Option<DifficultyTier>>,
}

impl StaticClassifier {
    pub fn new(tier: DifficultyTier) -> Self {
        Self {
            tier: Mutex::new(Some(tier)),
        }
    }

    /// A classifier whose every call errors.
    pub fn failing() -> Self {
        Self {
            tier: Mutex::new(None),
        }
    }

    pub async fn set_tier(&self, tier: DifficultyTier) {
        *self.tier.lock().await = Some(tier);
    }
}

mock_adapter!(StaticClassifier, "static-classifier", AdapterType::Classifier);

#[async_trait]
impl DifficultyClassifier for StaticClassifier {
    async fn classify(&self, _text: &str) -> Result<DifficultyTier, TollgateError> {
        self.tier
            .lock()
            .await
            .ok_or_else(|| TollgateError::upstream("classifier", "no tier configured"))
    }
}

/// Retrieval index returning fixed passages and recording queries.
pub struct MockRetrieval {
    passages: Vec<ContextPassage>,
    queries: Mutex<Vec<RetrievalQuery>>,
    failure: Mutex<Option<String>>,
}

impl MockRetrieval {
    pub fn new(passages: Vec<ContextPassage>) -> Self {
        Self {
            passages,
            queries: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// A single passage labelled with `page`.
    pub fn passage(text: &str, page: Option<u32>) -> ContextPassage {
        ContextPassage {
            text: text.to_string(),
            score: 0.9,
            page_label: page.map(|p| p.to_string()),
        }
    }

    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().await = Some(message.into());
    }

    pub async fn queries(&self) -> Vec<RetrievalQuery> {
        self.queries.lock().await.clone()
    }
}

mock_adapter!(MockRetrieval, "mock-retrieval", AdapterType::Retrieval);

#[async_trait]
impl RetrievalAdapter for MockRetrieval {
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<ContextPassage>, TollgateError> {
        self.queries.lock().await.push(query.clone());
        if let Some(message) = self.failure.lock().await.clone() {
            return Err(TollgateError::upstream("retrieval", message));
        }
        Ok(self
            .passages
            .iter()
            .filter(|p| query.page_filter.is_none() || p.page_label == query.page_filter)
            .take(query.top_k)
            .cloned()
            .collect())
    }
}

/// Identity provider that accepts a fixed set of tokens.
#[derive(Default)]
pub struct MockIdentityProvider {
    accepted: HashMap<String, String>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as proof of `email`.
    pub fn accept(mut self, token: &str, email: &str) -> Self {
        self.accepted.insert(token.to_string(), email.to_string());
        self
    }
}

mock_adapter!(MockIdentityProvider, "mock-identity", AdapterType::Identity);

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn verify_external(&self, token: &str) -> Result<ExternalIdentity, TollgateError> {
        self.accepted
            .get(token)
            .map(|email| ExternalIdentity {
                email: email.clone(),
            })
            .ok_or(TollgateError::Unauthenticated(AuthFailure::Invalid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn safety_gate_counts_and_fails() {
        let gate = MockSafetyGate::new(SafetyVerdict::Safe);
        assert_eq!(gate.evaluate("x").await.unwrap(), SafetyVerdict::Safe);
        gate.fail_with("timeout").await;
        assert!(gate.evaluate("x").await.is_err());
        assert_eq!(gate.calls(), 2);
    }

    #[tokio::test]
    async fn retrieval_filters_by_page() {
        let retrieval = MockRetrieval::new(vec![
            MockRetrieval::passage("intro", Some(1)),
            MockRetrieval::passage("photosynthesis", Some(12)),
        ]);
        let query = RetrievalQuery {
            text: "page 12".into(),
            page_filter: Some("12".into()),
            top_k: 3,
        };
        let passages = retrieval.retrieve(&query).await.unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "photosynthesis");
        assert_eq!(retrieval.queries().await.len(), 1);
    }

    #[tokio::test]
    async fn identity_provider_accepts_known_tokens() {
        let idp = MockIdentityProvider::new().accept("good", "alice@example.com");
        assert_eq!(
            idp.verify_external("good").await.unwrap().user_id(),
            "alice"
        );
        assert!(idp.verify_external("bad").await.is_err());
    }

    #[tokio::test]
    async fn failing_classifier_errors() {
        assert!(StaticClassifier::failing().classify("x").await.is_err());
    }
}
