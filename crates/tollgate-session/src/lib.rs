// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and session layer for the Tollgate request router.
//!
//! - [`TokenSigner`] issues and verifies HS256 access tokens.
//! - [`RateLimiter`] enforces the per-user sliding-window quota.
//! - [`ConversationMemory`] keeps a token-bounded chat history per user.
//! - [`SessionStore`] owns the usage windows and memory handles.

pub mod limiter;
pub mod memory;
pub mod store;
pub mod token;

pub use limiter::RateLimiter;
pub use memory::{count_tokens, ConversationMemory};
pub use store::{MemoryHandle, SessionStore};
pub use token::TokenSigner;
