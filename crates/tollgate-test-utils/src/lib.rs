// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tollgate integration tests.
//!
//! Provides mock collaborators and a dispatcher harness for fast,
//! deterministic tests without external services.
//!
//! # Components
//!
//! - [`MockWorker`] - Worker adapter with queued responses and request capture
//! - [`MockSafetyGate`], [`StaticClassifier`], [`MockRetrieval`], [`MockIdentityProvider`]
//! - [`TestHarness`] - Fully wired dispatcher

pub mod harness;
pub mod mock_collaborators;
pub mod mock_worker;

pub use harness::{TestHarness, TestHarnessBuilder, TEST_SECRET};
pub use mock_collaborators::{MockIdentityProvider, MockRetrieval, MockSafetyGate, StaticClassifier};
pub use mock_worker::MockWorker;
