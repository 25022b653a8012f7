// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tollgate request router.

use std::time::Duration;

use thiserror::Error;

use crate::types::DifficultyTier;

/// Why a credential was refused.
///
/// Expired and malformed credentials are reported separately so callers can
/// tell a user to sign in again versus reporting a broken client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No credential was presented.
    Missing,
    /// The signature is valid but the validity horizon has passed.
    Expired,
    /// Bad structure, unsupported algorithm, or signature mismatch.
    Invalid,
}

impl AuthFailure {
    /// User-facing reason text.
    pub fn detail(&self) -> &'static str {
        match self {
            AuthFailure::Missing => "Not authenticated",
            AuthFailure::Expired => "Token expired",
            AuthFailure::Invalid => "Invalid token",
        }
    }
}

/// The primary error type used across all Tollgate crates.
#[derive(Debug, Error)]
pub enum TollgateError {
    /// Missing, malformed, or expired credential.
    #[error("unauthenticated: {}", .0.detail())]
    Unauthenticated(AuthFailure),

    /// The caller used up their per-window request quota.
    #[error("rate limit exceeded for `{user_id}`: max {limit} requests per {window:?}")]
    RateLimitExceeded {
        user_id: String,
        limit: usize,
        window: Duration,
    },

    /// The safety gate labeled the request unsafe.
    #[error("request blocked by guard-rail policy")]
    ContentRejected,

    /// Every worker eligible for the tier is at its window limit.
    #[error("no worker with spare capacity for tier `{tier}`, retry after {retry_after:?}")]
    CapacityExhausted {
        tier: DifficultyTier,
        retry_after: Duration,
    },

    /// The selected worker failed transiently or did not answer in time.
    #[error("worker `{worker}` unavailable: {message}")]
    WorkerUnavailable { worker: String, message: String },

    /// Any other external collaborator failure (classifier, retrieval, identity provider, ...).
    #[error("{collaborator} error: {message}")]
    Upstream {
        collaborator: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (missing secret, invalid pool table).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TollgateError {
    /// Build an [`TollgateError::Upstream`] without an underlying source.
    pub fn upstream(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        TollgateError::Upstream {
            collaborator: collaborator.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Stable, machine-readable reason code for the failure class.
    ///
    /// Used as a metrics label and in JSON error bodies. Everything that is
    /// not one of the four admission failures collapses to `upstream_failure`.
    pub fn reason_code(&self) -> &'static str {
        match self {
            TollgateError::Unauthenticated(_) => "unauthenticated",
            TollgateError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            TollgateError::ContentRejected => "content_rejected",
            TollgateError::CapacityExhausted { .. } => "capacity_exhausted",
            TollgateError::WorkerUnavailable { .. }
            | TollgateError::Upstream { .. }
            | TollgateError::Config(_)
            | TollgateError::Internal(_) => "upstream_failure",
        }
    }
}
