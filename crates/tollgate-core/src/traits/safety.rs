// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Safety gate trait.

use async_trait::async_trait;

use crate::error::TollgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::SafetyVerdict;

/// Labels request text safe or unsafe before any worker sees it.
#[async_trait]
pub trait SafetyGate: PluginAdapter {
    /// Evaluate the given text.
    async fn evaluate(&self, text: &str) -> Result<SafetyVerdict, TollgateError>;
}
