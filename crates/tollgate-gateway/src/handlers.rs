// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tollgate_core::TollgateError;

use crate::auth::extract_credential;
use crate::error::{ApiError, ErrorResponse};
use crate::server::GatewayState;

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response body for POST /chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// Registry name of the worker that answered.
    pub model_used: String,
    pub credits_remaining: usize,
}

/// Request body for POST /auth/google.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    /// Google ID token from the sign-in widget.
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub workers: Vec<WorkerHealth>,
}

/// Capacity of one worker in the current window.
#[derive(Debug, Serialize)]
pub struct WorkerHealth {
    pub name: String,
    pub hit_count: u32,
    pub window_limit: u32,
    pub remaining: u32,
}

/// POST /chat
pub async fn post_chat(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let credential = extract_credential(&headers, &state.cookie.name);
    let done = state.dispatcher.dispatch(credential.as_deref(), &body.message).await?;
    Ok(Json(ChatResponse {
        response: done.response,
        model_used: done.worker,
        credits_remaining: done.credits_remaining,
    }))
}

/// POST /auth/google
///
/// Exchanges a Google ID token for a Tollgate session cookie.
pub async fn post_auth_google(
    State(state): State<GatewayState>,
    Json(body): Json<GoogleLoginRequest>,
) -> Response {
    let Some(identity) = &state.identity else {
        return ApiError(TollgateError::Config("Google sign-in is not configured".into()))
            .into_response();
    };

    let external = match identity.verify_external(&body.token).await {
        Ok(external) => external,
        Err(TollgateError::Unauthenticated(_)) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    detail: "Invalid Google token".to_string(),
                    reason: "unauthenticated",
                }),
            )
                .into_response();
        }
        Err(e) => return ApiError(e).into_response(),
    };

    let user_id = external.user_id().to_string();
    let issued = state
        .dispatcher
        .signer()
        .issue(&user_id, &state.default_role)
        .and_then(|token| state.cookie.session_cookie(&token));
    let cookie = match issued {
        Ok(cookie) => cookie,
        Err(e) => return ApiError(e).into_response(),
    };

    tracing::info!(user_id = %user_id, "user signed in");
    (
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            status: "success",
            user_id: Some(user_id),
        }),
    )
        .into_response()
}

/// POST /auth/logout
pub async fn post_auth_logout(State(state): State<GatewayState>) -> Response {
    match state.cookie.clear_cookie() {
        Ok(cookie) => (
            [(header::SET_COOKIE, cookie)],
            Json(LoginResponse {
                status: "success",
                user_id: None,
            }),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let workers = state
        .dispatcher
        .capacity_snapshot()
        .await
        .into_iter()
        .map(|w| WorkerHealth {
            remaining: w.remaining(),
            name: w.name,
            hit_count: w.hit_count,
            window_limit: w.window_limit,
        })
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        workers,
    })
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_deserializes() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(req.message, "hi");
    }

    #[test]
    fn chat_response_uses_model_used_key() {
        let json = serde_json::to_value(ChatResponse {
            response: "hello".into(),
            model_used: "qwen/qwen3-32b".into(),
            credits_remaining: 7,
        })
        .unwrap();
        assert_eq!(json["model_used"], "qwen/qwen3-32b");
        assert_eq!(json["credits_remaining"], 7);
    }

    #[test]
    fn logout_response_omits_user_id() {
        let json = serde_json::to_string(&LoginResponse {
            status: "success",
            user_id: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"success"}"#);
    }
}
