// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps `TollgateError` onto HTTP responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tollgate_core::TollgateError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub detail: String,
    /// Stable machine-readable reason code.
    pub reason: &'static str,
}

/// A `TollgateError` rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TollgateError);

impl From<TollgateError> for ApiError {
    fn from(err: TollgateError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TollgateError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            TollgateError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            TollgateError::ContentRejected => StatusCode::FORBIDDEN,
            TollgateError::CapacityExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TollgateError::WorkerUnavailable { .. }
            | TollgateError::Upstream { .. }
            | TollgateError::Config(_)
            | TollgateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> String {
        match &self.0 {
            TollgateError::Unauthenticated(failure) => failure.detail().to_string(),
            TollgateError::RateLimitExceeded { limit, .. } => {
                format!("Hitting rate limit! Max {limit} requests per minute.")
            }
            TollgateError::ContentRejected => "Request blocked by guard-rail policy.".to_string(),
            TollgateError::CapacityExhausted { retry_after, .. } => format!(
                "All AI models are currently at capacity. Please wait {}s.",
                retry_after.as_secs()
            ),
            TollgateError::WorkerUnavailable { message, .. }
            | TollgateError::Upstream { message, .. } => {
                format!("AI Processing Failed: {message}")
            }
            TollgateError::Config(message) | TollgateError::Internal(message) => {
                format!("AI Processing Failed: {message}")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorResponse {
            detail: self.detail(),
            reason: self.0.reason_code(),
        };
        let mut response = (status, Json(body)).into_response();
        if let TollgateError::CapacityExhausted { retry_after, .. } = &self.0 {
            response.headers_mut().insert(
                RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs()),
            );
        }
        response
    }
}
