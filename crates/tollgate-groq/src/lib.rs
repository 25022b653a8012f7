// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible chat-completions adapters for Tollgate.
//!
//! [`GroqWorker`] answers dispatched requests with the model named by the
//! selected worker. [`GuardModelSafetyGate`] labels incoming text with a
//! guard model. Both share [`ChatClient`].

pub mod client;
pub mod guard;
pub mod types;
pub mod worker;

pub use client::ChatClient;
pub use guard::{GuardModelSafetyGate, parse_verdict};
pub use worker::GroqWorker;
