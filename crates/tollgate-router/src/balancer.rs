// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capacity-aware load balancing over the worker registry.
//!
//! Each worker admits at most `window_limit` requests per capacity window.
//! Selection picks the eligible worker with the most remaining capacity,
//! breaking ties by registry order.
//!
//! Hit counts are reset lazily: when a selection finds the window elapsed,
//! it zeroes the counts of the workers eligible for *that* tier only and
//! restarts the shared window clock. Workers outside the tier keep their
//! counts until a later selection for one of their tiers resets them.

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tollgate_config::model::PoolConfig;
use tollgate_core::{DifficultyTier, TollgateError};

use crate::registry::WorkerRegistry;

/// Point-in-time capacity of one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCapacity {
    pub name: String,
    pub hit_count: u32,
    pub window_limit: u32,
}

impl WorkerCapacity {
    pub fn remaining(&self) -> u32 {
        self.window_limit.saturating_sub(self.hit_count)
    }
}

/// Outcome of a successful selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Registry name of the chosen worker.
    pub worker: String,
    /// Capacity the worker has left in this window after the admission.
    pub remaining: u32,
}

#[derive(Debug)]
struct PoolState {
    hits: Vec<u32>,
    last_reset: Instant,
}

impl PoolState {
    fn select(
        &mut self,
        registry: &WorkerRegistry,
        tier: DifficultyTier,
        now: Instant,
        window: Duration,
    ) -> Option<(usize, u32)> {
        let eligible = registry.eligible(tier);
        let workers = registry.workers();

        if now.saturating_duration_since(self.last_reset) > window {
            for &i in &eligible {
                self.hits[i] = 0;
            }
            self.last_reset = now;
            tracing::debug!(%tier, "capacity window reset");
        }

        let chosen = eligible
            .into_iter()
            .filter(|&i| self.hits[i] < workers[i].window_limit)
            .min_by_key(|&i| Reverse(workers[i].window_limit - self.hits[i]))?;

        self.hits[chosen] += 1;
        Some((chosen, workers[chosen].window_limit - self.hits[chosen]))
    }
}

/// Greedy max-remaining-capacity selector.
///
/// All pool state sits behind one lock so the reset, the capacity check,
/// and the increment happen as a single step.
#[derive(Debug)]
pub struct LoadBalancer {
    registry: WorkerRegistry,
    window: Duration,
    retry_after: Duration,
    state: Mutex<PoolState>,
}

impl LoadBalancer {
    pub fn new(registry: WorkerRegistry, window: Duration, retry_after: Duration) -> Self {
        Self::new_at(registry, window, retry_after, Instant::now())
    }

    /// Create a balancer whose first capacity window starts at `start`.
    pub fn new_at(
        registry: WorkerRegistry,
        window: Duration,
        retry_after: Duration,
        start: Instant,
    ) -> Self {
        let hits = vec![0; registry.len()];
        Self {
            registry,
            window,
            retry_after,
            state: Mutex::new(PoolState {
                hits,
                last_reset: start,
            }),
        }
    }

    pub fn from_config(config: &PoolConfig) -> Result<Self, TollgateError> {
        Ok(Self::new(
            WorkerRegistry::from_config(config)?,
            Duration::from_secs(config.window_secs),
            Duration::from_secs(config.retry_after_secs),
        ))
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    /// Delay advertised when every eligible worker is saturated.
    pub fn retry_after(&self) -> Duration {
        self.retry_after
    }

    /// Admit one request for `tier` and return the chosen worker.
    pub async fn select_worker(&self, tier: DifficultyTier) -> Result<Selection, TollgateError> {
        self.select_worker_at(tier, Instant::now()).await
    }

    /// Admit one request as if the current time were `now`.
    ///
    /// On exhaustion no state changes besides a possible window reset.
    pub async fn select_worker_at(
        &self,
        tier: DifficultyTier,
        now: Instant,
    ) -> Result<Selection, TollgateError> {
        let mut state = self.state.lock().await;
        match state.select(&self.registry, tier, now, self.window) {
            Some((index, remaining)) => {
                let worker = self.registry.workers()[index].name.clone();
                tracing::debug!(%tier, worker = %worker, remaining, "worker selected");
                Ok(Selection { worker, remaining })
            }
            None => {
                tracing::warn!(%tier, "all eligible workers at capacity");
                Err(TollgateError::CapacityExhausted {
                    tier,
                    retry_after: self.retry_after,
                })
            }
        }
    }

    /// Hit counts and limits for every worker, in registry order.
    pub async fn capacity_snapshot(&self) -> Vec<WorkerCapacity> {
        let state = self.state.lock().await;
        self.registry
            .workers()
            .iter()
            .zip(state.hits.iter())
            .map(|(w, &hit_count)| WorkerCapacity {
                name: w.name.clone(),
                hit_count,
                window_limit: w.window_limit,
            })
            .collect()
    }
}
