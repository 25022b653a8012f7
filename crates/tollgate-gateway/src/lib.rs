// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Tollgate request router.
//!
//! Exposes the dispatcher over `POST /chat`, handles Google sign-in and
//! session cookies, and serves unauthenticated health and metrics
//! endpoints.

pub mod auth;
pub mod error;
pub mod google;
pub mod handlers;
pub mod server;

pub use auth::{CookieSettings, extract_credential};
pub use error::ApiError;
pub use google::GoogleIdentityProvider;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, cors_layer, start_server};
