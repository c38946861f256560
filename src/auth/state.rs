//! Sign-in state as seen by one client.

use super::{AdminAllowlist, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    AuthenticatedNonAdmin { email: String },
    AuthenticatedAdmin { email: String },
}

impl AuthState {
    /// Derive the state carried by a resolved session cookie.
    pub fn from_session(session: Option<&Session>, allowlist: &AdminAllowlist) -> Self {
        match session {
            Some(session) => Self::classify(&session.email, allowlist),
            None => AuthState::Anonymous,
        }
    }

    fn classify(email: &str, allowlist: &AdminAllowlist) -> Self {
        if allowlist.is_admin(email) {
            AuthState::AuthenticatedAdmin {
                email: email.to_string(),
            }
        } else {
            AuthState::AuthenticatedNonAdmin {
                email: email.to_string(),
            }
        }
    }

    /// A sign-in attempt starts from any state; an existing session is replaced.
    pub fn begin_sign_in(self) -> Self {
        AuthState::Authenticating
    }

    pub fn complete_sign_in(self, email: &str, allowlist: &AdminAllowlist) -> Self {
        match self {
            AuthState::Authenticating => Self::classify(email, allowlist),
            other => other,
        }
    }

    pub fn fail_sign_in(self) -> Self {
        match self {
            AuthState::Authenticating => AuthState::Anonymous,
            other => other,
        }
    }

    pub fn sign_out(self) -> Self {
        AuthState::Anonymous
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AuthState::AuthenticatedAdmin { .. })
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            AuthState::AuthenticatedAdmin { email } | AuthState::AuthenticatedNonAdmin { email } => {
                Some(email)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist() -> AdminAllowlist {
        AdminAllowlist::new(["owner@motionwealthgroup.com"])
    }

    #[test]
    fn test_allowlisted_sign_in_becomes_admin() {
        let state = AuthState::Anonymous
            .begin_sign_in()
            .complete_sign_in("Owner@MotionWealthGroup.com", &allowlist());
        assert!(state.is_admin());
        assert_eq!(state.email(), Some("Owner@MotionWealthGroup.com"));
    }

    #[test]
    fn test_other_sign_in_is_non_admin() {
        let state = AuthState::Anonymous
            .begin_sign_in()
            .complete_sign_in("visitor@example.com", &allowlist());
        assert_eq!(
            state,
            AuthState::AuthenticatedNonAdmin {
                email: "visitor@example.com".to_string()
            }
        );
        assert!(!state.is_admin());
    }

    #[test]
    fn test_failed_sign_in_returns_to_anonymous() {
        let state = AuthState::Anonymous.begin_sign_in().fail_sign_in();
        assert_eq!(state, AuthState::Anonymous);
    }

    #[test]
    fn test_completion_without_attempt_is_ignored() {
        let state = AuthState::Anonymous.complete_sign_in("owner@motionwealthgroup.com", &allowlist());
        assert_eq!(state, AuthState::Anonymous);
    }

    #[test]
    fn test_sign_out_from_admin() {
        let state = AuthState::AuthenticatedAdmin {
            email: "owner@motionwealthgroup.com".to_string(),
        };
        assert_eq!(state.sign_out(), AuthState::Anonymous);
    }
}
