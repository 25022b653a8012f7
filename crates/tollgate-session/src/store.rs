// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user session state: usage windows and conversation memory.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;

use crate::limiter::RateLimiter;
use crate::memory::ConversationMemory;

/// Shared handle to one user's conversation memory.
pub type MemoryHandle = Arc<Mutex<ConversationMemory>>;

/// Owns every user's usage window and memory handle.
///
/// Memory handles are created on first use and live for the lifetime of
/// the process.
#[derive(Debug)]
pub struct SessionStore {
    limiter: RateLimiter,
    memories: DashMap<String, MemoryHandle>,
    token_limit: usize,
}

impl SessionStore {
    pub fn new(limiter: RateLimiter, token_limit: usize) -> Self {
        Self {
            limiter,
            memories: DashMap::new(),
            token_limit,
        }
    }

    pub fn from_config(config: &TollgateConfig) -> Self {
        Self::new(
            RateLimiter::from_config(&config.rate_limit),
            config.memory.token_limit,
        )
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Charge one request to `user_id`; returns the quota left afterwards.
    pub fn check_and_record_usage(&self, user_id: &str) -> Result<usize, TollgateError> {
        self.limiter.check_and_record(user_id)
    }

    /// Quota left for `user_id` without charging.
    pub fn remaining_quota(&self, user_id: &str) -> usize {
        self.limiter.remaining(user_id)
    }

    /// The user's memory handle, created on first call.
    ///
    /// Concurrent callers for the same user receive clones of one handle.
    pub fn get_or_create_memory(&self, user_id: &str) -> MemoryHandle {
        self.memories
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(user_id, token_limit = self.token_limit, "creating conversation memory");
                Arc::new(Mutex::new(ConversationMemory::new(self.token_limit)))
            })
            .clone()
    }

    /// Number of users with a memory handle.
    pub fn memory_count(&self) -> usize {
        self.memories.len()
    }
}
