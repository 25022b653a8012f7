// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request dispatcher for the Tollgate request router.
//!
//! Ties the session layer, safety gate, classifier, load balancer,
//! retrieval index, and workers together into one admission pipeline.

pub mod dispatcher;
pub mod page;

pub use dispatcher::{Collaborators, Completed, DispatchSettings, DispatchState, Dispatcher};
pub use page::extract_page_filter;
