// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Difficulty classifier trait.

use async_trait::async_trait;

use crate::error::TollgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::DifficultyTier;

/// Maps request text to a [`DifficultyTier`].
///
/// Implementations may fail (network, model errors). The dispatcher never
/// sees those failures: it wraps classifiers so that any error degrades to
/// [`DifficultyTier::Fast`].
#[async_trait]
pub trait DifficultyClassifier: PluginAdapter {
    /// Classify the given text.
    async fn classify(&self, text: &str) -> Result<DifficultyTier, TollgateError>;
}
