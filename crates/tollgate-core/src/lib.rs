// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tollgate request router.
//!
//! This crate provides the error taxonomy, the shared domain types, and the
//! collaborator traits that every other Tollgate crate builds on. External
//! services (classifier, safety gate, retrieval index, model workers,
//! identity provider) are only ever reached through the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AuthFailure, TollgateError};
pub use types::{AdapterType, DifficultyTier, HealthStatus, SafetyVerdict};

// Re-export all collaborator traits at crate root.
pub use traits::{
    DifficultyClassifier, EmbeddingAdapter, IdentityProvider, PluginAdapter, RetrievalAdapter,
    SafetyGate, WorkerAdapter,
};
