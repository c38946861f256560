//! Admin gate middleware.
//!
//! The session cookie is the only credential consulted. Anything short of a
//! live session for an allowlisted e-mail is denied.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use super::{clear_session_cookie, AuthState, DENIED_REDIRECT, DENIED_REDIRECT_AFTER_MS, SESSION_COOKIE};
use crate::state::{AppState, SharedState};

/// The admitted caller, available to admin handlers as a request extension.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDenial {
    pub error: String,
    pub redirect_to: &'static str,
    pub redirect_after_ms: u64,
}

fn deny(status: StatusCode, message: &str, set_cookie: Option<String>) -> Response {
    let mut response = (
        status,
        Json(GateDenial {
            error: message.to_string(),
            redirect_to: DENIED_REDIRECT,
            redirect_after_ms: DENIED_REDIRECT_AFTER_MS,
        }),
    )
        .into_response();

    if let Some(cookie) = set_cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Auth state for the caller's cookie; lookup failures count as anonymous.
pub async fn current_auth_state(state: &AppState, jar: &CookieJar) -> AuthState {
    let Some(token) = session_token(jar) else {
        return AuthState::Anonymous;
    };

    match state.sessions.resolve(&token).await {
        Ok(session) => AuthState::from_session(session.as_ref(), &state.allowlist),
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            AuthState::Anonymous
        }
    }
}

pub async fn require_admin(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let secure = state.config.is_production();
    let path = request.uri().path().to_string();

    let Some(token) = session_token(&jar) else {
        tracing::debug!(path = %path, "admin request without session");
        return deny(StatusCode::UNAUTHORIZED, "Authentication required", None);
    };

    let session = match state.sessions.resolve(&token).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::info!(path = %path, "admin request with unknown or expired session");
            return deny(
                StatusCode::UNAUTHORIZED,
                "Session expired. Please sign in again.",
                Some(clear_session_cookie(secure)),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path, "session lookup failed, denying");
            return deny(
                StatusCode::SERVICE_UNAVAILABLE,
                "Unable to verify your session. Please try again.",
                None,
            );
        }
    };

    if !AuthState::from_session(Some(&session), &state.allowlist).is_admin() {
        tracing::warn!(email = %session.email, path = %path, "non-admin denied");
        return deny(
            StatusCode::FORBIDDEN,
            "You do not have permission to access this page.",
            None,
        );
    }

    request.extensions_mut().insert(AdminIdentity {
        uid: session.uid,
        email: session.email,
    });
    next.run(request).await
}
