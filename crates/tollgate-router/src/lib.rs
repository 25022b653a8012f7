// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker selection for the Tollgate request router.
//!
//! This crate provides:
//! - [`WorkerRegistry`]: the static, validated worker pool
//! - [`LoadBalancer`]: greedy max-remaining-capacity selection with a lazily reset window
//! - [`HeuristicClassifier`]: zero-cost keyword/length difficulty classification
//! - [`SemanticClassifier`]: nearest-utterance classification over embeddings
//! - [`GuardedClassifier`]: turns any classifier into a total one that degrades to `fast`

pub mod balancer;
pub mod classifier;
pub mod guarded;
pub mod registry;
pub mod semantic;

pub use balancer::{LoadBalancer, Selection, WorkerCapacity};
pub use classifier::{ClassificationResult, HeuristicClassifier};
pub use guarded::GuardedClassifier;
pub use registry::{WorkerDescriptor, WorkerRegistry};
pub use semantic::{cosine_similarity, default_routes, Route, SemanticClassifier};
