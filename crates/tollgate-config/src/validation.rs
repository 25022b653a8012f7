// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: a usable worker pool,
//! positive windows and quotas, and well-formed origins.

use std::collections::HashSet;

use tollgate_core::DifficultyTier;

use crate::diagnostic::ConfigError;
use crate::model::TollgateConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every failure found rather than stopping at the first.
pub fn validate_config(config: &TollgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    }

    for origin in &config.server.allowed_origins {
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            errors.push(ConfigError::validation(format!(
                "server.allowed_origins entry `{origin}` must start with http:// or https://"
            )));
        } else if origin.ends_with('/') {
            errors.push(ConfigError::validation(format!(
                "server.allowed_origins entry `{origin}` must not end with a slash"
            )));
        }
    }

    if config.auth.token_ttl_hours <= 0 {
        errors.push(ConfigError::validation(format!(
            "auth.token_ttl_hours must be positive, got {}",
            config.auth.token_ttl_hours
        )));
    }

    if config.auth.cookie_name.trim().is_empty() {
        errors.push(ConfigError::validation("auth.cookie_name must not be empty"));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ConfigError::validation(
            "rate_limit.max_requests must be at least 1",
        ));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ConfigError::validation(
            "rate_limit.window_secs must be at least 1",
        ));
    }

    if config.pool.window_secs == 0 {
        errors.push(ConfigError::validation("pool.window_secs must be at least 1"));
    }

    validate_pool(config, &mut errors);

    if !(-1.0..=1.0).contains(&config.classifier.similarity_threshold) {
        errors.push(ConfigError::validation(format!(
            "classifier.similarity_threshold must be within [-1, 1], got {}",
            config.classifier.similarity_threshold
        )));
    }

    if config.classifier.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "classifier.timeout_secs must be at least 1",
        ));
    }

    if config.retrieval.top_k == 0 {
        errors.push(ConfigError::validation("retrieval.top_k must be at least 1"));
    }

    if config.worker.timeout_secs == 0 {
        errors.push(ConfigError::validation("worker.timeout_secs must be at least 1"));
    }

    if config.memory.token_limit == 0 {
        errors.push(ConfigError::validation("memory.token_limit must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_pool(config: &TollgateConfig, errors: &mut Vec<ConfigError>) {
    let workers = &config.pool.workers;
    if workers.is_empty() {
        errors.push(ConfigError::validation(
            "pool.workers must list at least one worker",
        ));
        return;
    }

    let mut seen = HashSet::new();
    for worker in workers {
        let name = worker.name.trim();
        if name.is_empty() {
            errors.push(ConfigError::validation("pool.workers entry has an empty name"));
            continue;
        }
        if !seen.insert(name) {
            errors.push(ConfigError::validation(format!(
                "pool.workers name `{name}` appears more than once"
            )));
        }
        if worker.limit == 0 {
            errors.push(ConfigError::validation(format!(
                "pool.workers `{name}` limit must be at least 1"
            )));
        }
        if worker.tiers.is_empty() {
            errors.push(ConfigError::validation(format!(
                "pool.workers `{name}` must serve at least one tier"
            )));
        }
    }

    for tier in DifficultyTier::ALL {
        if !workers.iter().any(|w| w.tiers.contains(&tier)) {
            errors.push(ConfigError::validation(format!(
                "no worker in pool.workers serves the `{tier}` tier"
            )));
        }
    }
}
