// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HS256 access tokens.
//!
//! Tokens use the compact `header.claims.signature` layout with base64url
//! segments (no padding). Verification checks structure, algorithm, and the
//! HMAC-SHA256 signature before looking at the expiry, so a forged token is
//! always reported as invalid rather than expired.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tollgate_config::model::AuthConfig;
use tollgate_core::types::Identity;
use tollgate_core::{AuthFailure, TollgateError};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies signed access tokens with a shared server secret.
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[redacted]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer. An empty secret is a configuration error.
    pub fn new(secret: SecretString, ttl: Duration) -> Result<Self, TollgateError> {
        if secret.expose_secret().is_empty() {
            return Err(TollgateError::Config(
                "token signing secret must not be empty".to_string(),
            ));
        }
        if ttl <= Duration::zero() {
            return Err(TollgateError::Config(
                "token validity horizon must be positive".to_string(),
            ));
        }
        Ok(Self { secret, ttl })
    }

    /// Build a signer from the `[auth]` section.
    pub fn from_config(auth: &AuthConfig) -> Result<Self, TollgateError> {
        let secret = auth.signing_secret.clone().ok_or_else(|| {
            TollgateError::Config(
                "auth.signing_secret is not set (or export SECRET_KEY)".to_string(),
            )
        })?;
        Self::new(SecretString::from(secret), Duration::hours(auth.token_ttl_hours))
    }

    /// Validity horizon applied to newly issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `subject` valid from now until now + ttl.
    pub fn issue(&self, subject: &str, role: &str) -> Result<String, TollgateError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Mint a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TollgateError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let header = encode_segment(&header)?;
        let claims = encode_segment(&claims)?;
        let signing_input = format!("{header}.{claims}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify an optional credential; `None` or an empty string is `Missing`.
    pub fn verify_credential(&self, credential: Option<&str>) -> Result<Identity, TollgateError> {
        match credential.map(str::trim).filter(|c| !c.is_empty()) {
            Some(token) => self.verify(token),
            None => Err(TollgateError::Unauthenticated(AuthFailure::Missing)),
        }
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Identity, TollgateError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TollgateError> {
        let invalid = || TollgateError::Unauthenticated(AuthFailure::Invalid);

        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let header: Header = decode_segment(header_b64).ok_or_else(invalid)?;
        if header.alg != ALGORITHM {
            tracing::debug!(alg = %header.alg, "rejecting token with unsupported algorithm");
            return Err(invalid());
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| invalid())?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let claims: Claims = decode_segment(claims_b64).ok_or_else(invalid)?;
        if claims.sub.is_empty() {
            return Err(invalid());
        }
        if now.timestamp() >= claims.exp {
            return Err(TollgateError::Unauthenticated(AuthFailure::Expired));
        }
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(invalid)?;

        Ok(Identity {
            subject: claims.sub,
            role: claims.role,
            expires_at,
        })
    }

    fn mac(&self) -> Result<HmacSha256, TollgateError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TollgateError::Internal(format!("HMAC key rejected: {e}")))
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TollgateError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| TollgateError::Internal(format!("token encoding failed: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}
