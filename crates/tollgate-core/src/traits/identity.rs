// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider trait for third-party sign-in.

use async_trait::async_trait;

use crate::error::TollgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ExternalIdentity;

/// Verifies a token issued by an external identity provider.
///
/// Used only at sign-in; afterwards callers present Tollgate's own signed
/// credential.
#[async_trait]
pub trait IdentityProvider: PluginAdapter {
    /// Verify the provider token and return the asserted identity.
    async fn verify_external(&self, token: &str) -> Result<ExternalIdentity, TollgateError>;
}
