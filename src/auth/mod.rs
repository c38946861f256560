//! Admin authentication: identity verification, server sessions and the admin gate.

pub mod allowlist;
pub mod gate;
pub mod identity;
pub mod session;
pub mod state;

use std::time::Duration;

use thiserror::Error;

pub use allowlist::AdminAllowlist;
pub use gate::{require_admin, AdminIdentity};
pub use identity::{FirebaseVerifier, IdentityVerifier, SharedSecretVerifier, VerifiedIdentity};
pub use session::{Session, SessionError, SessionStore};
pub use state::AuthState;

/// Cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "mwg_admin_session";

/// Where the front end sends denied users, and after how long.
pub const DENIED_REDIRECT: &str = "/";
pub const DENIED_REDIRECT_AFTER_MS: u64 = 3000;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid ID token: {0}")]
    InvalidToken(String),

    #[error("ID token has no verified e-mail")]
    MissingEmail,

    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidToken(e.to_string())
    }
}

pub fn session_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", Duration::from_secs(60), true);
        assert_eq!(
            cookie,
            "mwg_admin_session=abc; Path=/; HttpOnly; SameSite=Strict; Max-Age=60; Secure"
        );
        assert!(!session_cookie("abc", Duration::from_secs(60), false).contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
