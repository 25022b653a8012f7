// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker adapter trait for backend language-model invocation.

use async_trait::async_trait;

use crate::error::TollgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::WorkerRequest;

/// Invokes a named backend worker and returns the generated text.
///
/// A single adapter serves every worker in the pool; the worker name in the
/// request selects the upstream model. Transient failures should be
/// reported as [`TollgateError::WorkerUnavailable`].
#[async_trait]
pub trait WorkerAdapter: PluginAdapter {
    /// Generate a response for the request.
    async fn invoke(&self, request: WorkerRequest) -> Result<String, TollgateError>;
}
