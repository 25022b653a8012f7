// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Makes any classifier total: failures and timeouts degrade to `fast`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tollgate_core::types::{AdapterType, HealthStatus};
use tollgate_core::{DifficultyClassifier, DifficultyTier, PluginAdapter, TollgateError};

/// Wraps a classifier so `classify` never fails.
pub struct GuardedClassifier {
    inner: Arc<dyn DifficultyClassifier>,
    timeout: Duration,
}

impl GuardedClassifier {
    pub fn new(inner: Arc<dyn DifficultyClassifier>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Classify, returning `fast` when the inner classifier errors or
    /// exceeds the timeout.
    pub async fn classify_or_fast(&self, text: &str) -> DifficultyTier {
        match tokio::time::timeout(self.timeout, self.inner.classify(text)).await {
            Ok(Ok(tier)) => tier,
            Ok(Err(e)) => {
                tracing::warn!(classifier = self.inner.name(), error = %e, "classifier failed, using fast tier");
                DifficultyTier::Fast
            }
            Err(_) => {
                tracing::warn!(
                    classifier = self.inner.name(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "classifier timed out, using fast tier"
                );
                DifficultyTier::Fast
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for GuardedClassifier {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        match self.inner.health_check().await {
            Ok(status) => Ok(status),
            Err(e) => Ok(HealthStatus::Degraded(format!(
                "classifier unavailable, requests fall back to fast: {e}"
            ))),
        }
    }
}

#[async_trait]
impl DifficultyClassifier for GuardedClassifier {
    async fn classify(&self, text: &str) -> Result<DifficultyTier, TollgateError> {
        Ok(self.classify_or_fast(text).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;
    struct Slow;

    macro_rules! adapter {
        ($ty:ty) => {
            #[async_trait]
            impl PluginAdapter for $ty {
                fn name(&self) -> &str {
                    stringify!($ty)
                }
                fn version(&self) -> semver::Version {
                    semver::Version::new(0, 0, 0)
                }
                fn adapter_type(&self) -> AdapterType {
                    AdapterType::Classifier
                }
                async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
                    Ok(HealthStatus::Healthy)
                }
            }
        };
    }

    adapter!(Failing);
    adapter!(Slow);

    #[async_trait]
    impl DifficultyClassifier for Failing {
        async fn classify(&self, _text: &str) -> Result<DifficultyTier, TollgateError> {
            Err(TollgateError::upstream("embedding", "HTTP 503"))
        }
    }

    #[async_trait]
    impl DifficultyClassifier for Slow {
        async fn classify(&self, _text: &str) -> Result<DifficultyTier, TollgateError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(DifficultyTier::Reasoning)
        }
    }

    #[tokio::test]
    async fn errors_degrade_to_fast() {
        let guarded = GuardedClassifier::new(Arc::new(Failing), Duration::from_secs(5));
        assert_eq!(
            guarded.classify("prove it").await.unwrap(),
            DifficultyTier::Fast
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_degrade_to_fast() {
        let guarded = GuardedClassifier::new(Arc::new(Slow), Duration::from_secs(1));
        assert_eq!(guarded.classify_or_fast("prove it").await, DifficultyTier::Fast);
    }

    #[tokio::test]
    async fn passes_through_success() {
        let guarded = GuardedClassifier::new(
            Arc::new(crate::HeuristicClassifier::new()),
            Duration::from_secs(1),
        );
        assert_eq!(
            guarded.classify("prove the binomial theorem").await.unwrap(),
            DifficultyTier::Reasoning
        );
    }
}
