// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential extraction and session cookies.
//!
//! A credential is read from the session cookie first, then from an
//! `Authorization: Bearer <token>` header.

use axum::http::{HeaderMap, HeaderValue, header};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tollgate_config::model::AuthConfig;
use tollgate_core::TollgateError;

/// How the session cookie is named and flagged.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: u64,
}

impl CookieSettings {
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            name: auth.cookie_name.clone(),
            secure: auth.cookie_secure,
            max_age_secs: u64::try_from(auth.token_ttl_hours).unwrap_or(0) * 3600,
        }
    }

    /// `Set-Cookie` value carrying a freshly issued token.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, TollgateError> {
        let max_age = std::time::Duration::from_secs(self.max_age_secs)
            .try_into()
            .map_err(|_| TollgateError::Internal("cookie max-age out of range".into()))?;
        let cookie = Cookie::build((self.name.clone(), token.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .build();
        to_header(&cookie)
    }

    /// `Set-Cookie` value that expires the session cookie immediately.
    pub fn clear_cookie(&self) -> Result<HeaderValue, TollgateError> {
        let mut cookie = Cookie::build((self.name.clone(), String::new()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();
        cookie.make_removal();
        to_header(&cookie)
    }
}

fn to_header(cookie: &Cookie<'_>) -> Result<HeaderValue, TollgateError> {
    let mut value = HeaderValue::from_str(&cookie.encoded().to_string())
        .map_err(|e| TollgateError::Internal(format!("invalid cookie value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// A cookie's value by name across every `Cookie` header, quotes removed.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(name)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|value| !value.is_empty())
}

/// The bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The credential presented with a request: cookie first, then bearer.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers).map(str::to_string))
}
