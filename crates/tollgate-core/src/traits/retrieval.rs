// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval adapter trait for context passage lookup.

use async_trait::async_trait;

use crate::error::TollgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ContextPassage, RetrievalQuery};

/// Supplies ranked context passages for a query.
///
/// When `query.page_filter` is set, implementations must return only
/// passages whose page label equals that page exactly.
#[async_trait]
pub trait RetrievalAdapter: PluginAdapter {
    /// Retrieve the best passages for the query, best first.
    async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<ContextPassage>, TollgateError>;
}
