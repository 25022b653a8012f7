// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tollgate.toml` > `~/.config/tollgate/tollgate.toml` > `/etc/tollgate/tollgate.toml`
//! with environment variable overrides via `TOLLGATE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TollgateConfig;

/// Top-level sections, used to split `TOLLGATE_<SECTION>_<KEY>` variables.
const SECTIONS: &[&str] = &[
    "server",
    "auth",
    "rate_limit",
    "pool",
    "classifier",
    "safety",
    "retrieval",
    "worker",
    "embedding",
    "memory",
    "prometheus",
];

/// Unprefixed variables accepted for secrets, and the keys they fill.
const RAW_SECRETS: &[(&str, &str)] = &[
    ("SECRET_KEY", "auth.signing_secret"),
    ("GOOGLE_CLIENT_ID", "auth.google_client_id"),
    ("GROQ_API_KEY", "worker.api_key"),
    ("JINA_API_KEY", "embedding.api_key"),
    ("PINECONE_API_KEY", "retrieval.api_key"),
];

/// TOML files consulted by [`load_config`], lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/tollgate/tollgate.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("tollgate/tollgate.toml"));
    }
    paths.push(PathBuf::from("tollgate.toml"));
    paths
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tollgate/tollgate.toml` (system-wide)
/// 3. `~/.config/tollgate/tollgate.toml` (user XDG config)
/// 4. `./tollgate.toml` (local directory)
/// 5. Unprefixed secret variables (`SECRET_KEY`, `GROQ_API_KEY`, ...)
/// 6. `TOLLGATE_*` environment variables
pub fn load_config() -> Result<TollgateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing.
pub fn load_config_from_str(toml_content: &str) -> Result<TollgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TollgateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TollgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TollgateConfig::default()))
        .merge(Toml::file(path))
        .merge(raw_secret_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(TollgateConfig::default()));
    for path in config_file_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(raw_secret_provider()).merge(env_provider())
}

/// Map an env var name (prefix stripped) to a dotted config key.
///
/// Only the first `_` after a known section name becomes a dot, so
/// `TOLLGATE_RATE_LIMIT_MAX_REQUESTS` maps to `rate_limit.max_requests`
/// and `TOLLGATE_AUTH_TOKEN_TTL_HOURS` maps to `auth.token_ttl_hours`.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

fn env_provider() -> Env {
    Env::prefixed("TOLLGATE_").map(|key| map_env_key(key.as_str()).into())
}

fn raw_secret_provider() -> Env {
    let names: Vec<&str> = RAW_SECRETS.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        RAW_SECRETS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, target)| (*target).into())
            .unwrap_or_else(|| key.as_str().to_ascii_lowercase().into())
    })
}
