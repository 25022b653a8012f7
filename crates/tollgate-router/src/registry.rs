// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static worker registry built from `[pool]` configuration.

use std::collections::HashSet;

use tollgate_config::model::{PoolConfig, WorkerConfig};
use tollgate_core::{DifficultyTier, TollgateError};

/// Immutable description of one backend worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerDescriptor {
    /// Upstream model identifier.
    pub name: String,
    /// Tiers this worker may serve.
    pub tiers: Vec<DifficultyTier>,
    /// Admissions allowed per capacity window.
    pub window_limit: u32,
}

impl WorkerDescriptor {
    pub fn new(name: impl Into<String>, window_limit: u32, tiers: &[DifficultyTier]) -> Self {
        Self {
            name: name.into(),
            tiers: tiers.to_vec(),
            window_limit,
        }
    }

    pub fn serves(&self, tier: DifficultyTier) -> bool {
        self.tiers.contains(&tier)
    }
}

impl From<&WorkerConfig> for WorkerDescriptor {
    fn from(config: &WorkerConfig) -> Self {
        Self::new(config.name.trim(), config.limit, &config.tiers)
    }
}

/// Ordered worker registry. Order is significant: it breaks selection ties.
#[derive(Debug, Clone)]
pub struct WorkerRegistry {
    workers: Vec<WorkerDescriptor>,
}

impl WorkerRegistry {
    /// Build a registry, rejecting tables that could never admit a request.
    pub fn new(workers: Vec<WorkerDescriptor>) -> Result<Self, TollgateError> {
        if workers.is_empty() {
            return Err(TollgateError::Config(
                "worker pool must contain at least one worker".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for worker in &workers {
            if worker.name.is_empty() {
                return Err(TollgateError::Config("worker name must not be empty".to_string()));
            }
            if !seen.insert(worker.name.as_str()) {
                return Err(TollgateError::Config(format!(
                    "duplicate worker name `{}`",
                    worker.name
                )));
            }
            if worker.window_limit == 0 {
                return Err(TollgateError::Config(format!(
                    "worker `{}` must have a window limit of at least 1",
                    worker.name
                )));
            }
        }

        for tier in DifficultyTier::ALL {
            if !workers.iter().any(|w| w.serves(tier)) {
                return Err(TollgateError::Config(format!(
                    "no worker serves the `{tier}` tier"
                )));
            }
        }

        Ok(Self { workers })
    }

    pub fn from_config(config: &PoolConfig) -> Result<Self, TollgateError> {
        Self::new(config.workers.iter().map(WorkerDescriptor::from).collect())
    }

    pub fn workers(&self) -> &[WorkerDescriptor] {
        &self.workers
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&WorkerDescriptor> {
        self.workers.iter().find(|w| w.name == name)
    }

    /// Registry indices of the workers eligible for `tier`, in registry order.
    pub fn eligible(&self, tier: DifficultyTier) -> Vec<usize> {
        self.workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.serves(tier))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DifficultyTier::{Complex, Fast, Reasoning};

    #[test]
    fn default_pool_eligibility() {
        let registry = WorkerRegistry::from_config(&PoolConfig::default()).unwrap();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.eligible(Fast), vec![1, 4]);
        assert_eq!(registry.eligible(Complex), vec![0, 2, 3, 5, 6]);
        assert_eq!(registry.eligible(Reasoning), vec![2, 3, 4, 5]);
    }

    #[test]
    fn rejects_duplicates() {
        let err = WorkerRegistry::new(vec![
            WorkerDescriptor::new("a", 1, &[Fast, Complex, Reasoning]),
            WorkerDescriptor::new("a", 1, &[Fast]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_zero_limit() {
        assert!(
            WorkerRegistry::new(vec![WorkerDescriptor::new(
                "a",
                0,
                &[Fast, Complex, Reasoning]
            )])
            .is_err()
        );
    }

    #[test]
    fn rejects_uncovered_tier() {
        let err = WorkerRegistry::new(vec![WorkerDescriptor::new("a", 3, &[Fast, Complex])])
            .unwrap_err();
        assert!(err.to_string().contains("reasoning"));
    }

    #[test]
    fn rejects_empty_pool() {
        assert!(WorkerRegistry::new(Vec::new()).is_err());
    }

    #[test]
    fn lookup_by_name() {
        let registry = WorkerRegistry::from_config(&PoolConfig::default()).unwrap();
        let w = registry.get("qwen/qwen3-32b").unwrap();
        assert_eq!(w.window_limit, 60);
        assert!(w.serves(Reasoning));
        assert!(!w.serves(Fast));
        assert!(registry.get("gpt-5").is_none());
    }
}
