/**
 * Auth Routes
 * Session cookie exchange and the admin check used by the front end
 */
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::{clear_session_cookie, gate::current_auth_state, session_cookie, AuthState, SESSION_COOKIE};
use crate::error::ErrorResponse;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default)]
    pub id_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAdminResponse {
    pub is_admin: bool,
}

/// POST /api/auth/session - exchange an ID token for a session cookie
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<SessionRequest>,
) -> Response {
    if payload.id_token.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("ID token is required")),
        )
            .into_response();
    }

    let auth = AuthState::Anonymous.begin_sign_in();

    let identity = match state.verifier.verify(payload.id_token.trim()).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "ID token rejected");
            tracing::debug!(state = ?auth.fail_sign_in(), "sign-in failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Failed to create session")),
            )
                .into_response();
        }
    };

    let auth = auth.complete_sign_in(&identity.email, &state.allowlist);

    let (token, _session) = match state.sessions.issue(&identity).await {
        Ok(issued) => issued,
        Err(e) => {
            tracing::error!(error = %e, "failed to persist session");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Failed to create session")),
            )
                .into_response();
        }
    };

    tracing::info!(email = %identity.email, is_admin = auth.is_admin(), "session issued");

    let cookie = session_cookie(&token, state.sessions.ttl(), state.config.is_production());
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            success: true,
            is_admin: auth.is_admin(),
            email: auth.email().map(str::to_string),
        }),
    )
        .into_response()
}

/// DELETE /api/auth/session - revoke the session and clear the cookie
pub async fn delete_session(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        if let Err(e) = state.sessions.revoke(&token).await {
            tracing::error!(error = %e, "failed to revoke session");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Failed to sign out. Please try again.")),
            )
                .into_response();
        }
    }

    let auth = AuthState::Anonymous.sign_out();
    tracing::debug!(state = ?auth, "signed out");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie(state.config.is_production()))],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response()
}

/// GET /api/auth/check-admin
pub async fn check_admin(State(state): State<SharedState>, jar: CookieJar) -> Json<CheckAdminResponse> {
    let auth = current_auth_state(&state, &jar).await;
    Json(CheckAdminResponse {
        is_admin: auth.is_admin(),
    })
}
