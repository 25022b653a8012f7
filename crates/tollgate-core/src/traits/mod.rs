// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every external collaborator extends the [`PluginAdapter`] base trait and
//! uses `#[async_trait]` so the dispatcher can hold them as trait objects.

pub mod adapter;
pub mod classifier;
pub mod embedding;
pub mod identity;
pub mod retrieval;
pub mod safety;
pub mod worker;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use classifier::DifficultyClassifier;
pub use embedding::EmbeddingAdapter;
pub use identity::IdentityProvider;
pub use retrieval::RetrievalAdapter;
pub use safety::SafetyGate;
pub use worker::WorkerAdapter;
