// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google ID-token verification through the `tokeninfo` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tollgate_core::types::{AdapterType, ExternalIdentity, HealthStatus};
use tollgate_core::{AuthFailure, IdentityProvider, PluginAdapter, TollgateError};
use tracing::debug;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies Google sign-in ID tokens for one OAuth client.
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    client_id: String,
    tokeninfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(client_id: impl Into<String>) -> Result<Self, TollgateError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TollgateError::Upstream {
                collaborator: "google".into(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            client_id: client_id.into(),
            tokeninfo_url: TOKENINFO_URL.to_string(),
        })
    }

    /// Point at a different `tokeninfo` endpoint.
    pub fn with_tokeninfo_url(mut self, url: impl Into<String>) -> Self {
        self.tokeninfo_url = url.into();
        self
    }
}

#[async_trait]
impl PluginAdapter for GoogleIdentityProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, TollgateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn verify_external(&self, token: &str) -> Result<ExternalIdentity, TollgateError> {
        let url = reqwest::Url::parse_with_params(&self.tokeninfo_url, &[("id_token", token)])
            .map_err(|e| TollgateError::Config(format!("invalid tokeninfo url: {e}")))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TollgateError::Upstream {
                collaborator: "google".into(),
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if status.is_client_error() {
            debug!(status = %status, "google rejected id token");
            return Err(TollgateError::Unauthenticated(AuthFailure::Invalid));
        }
        if !status.is_success() {
            return Err(TollgateError::upstream(
                "google",
                format!("tokeninfo returned {status}"),
            ));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|_| TollgateError::Unauthenticated(AuthFailure::Invalid))?;

        if info.aud != self.client_id {
            debug!("id token audience does not match client id");
            return Err(TollgateError::Unauthenticated(AuthFailure::Invalid));
        }
        if let Some(iss) = &info.iss
            && !ISSUERS.contains(&iss.as_str())
        {
            debug!(%iss, "id token issued by unexpected party");
            return Err(TollgateError::Unauthenticated(AuthFailure::Invalid));
        }

        match info.email {
            Some(email) if !email.is_empty() => Ok(ExternalIdentity { email }),
            _ => Err(TollgateError::Unauthenticated(AuthFailure::Invalid)),
        }
    }
}
