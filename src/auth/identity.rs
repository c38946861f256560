//! ID-token verification against the identity provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::AuthError;

const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const KEY_CACHE_TTL: Duration = Duration::from_secs(3600);

pub const DEV_TOKEN_AUDIENCE: &str = "mwg-local";
pub const DEV_TOKEN_ISSUER: &str = "mwg-local-idp";

/// The caller as asserted by a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AuthError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct IdTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, skip_deserializing)]
    aud: String,
    #[serde(default, skip_deserializing)]
    iss: String,
    exp: i64,
    iat: i64,
}

impl IdTokenClaims {
    fn into_identity(self) -> Result<VerifiedIdentity, AuthError> {
        if self.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthError::MissingEmail)?;
        if !self.email_verified {
            return Err(AuthError::MissingEmail);
        }

        Ok(VerifiedIdentity {
            uid: self.sub,
            email,
            email_verified: self.email_verified,
            name: self.name,
        })
    }
}

// ============================================================================
// Hosted provider (RS256, published JWKS)
// ============================================================================

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

pub struct FirebaseVerifier {
    project_id: String,
    client: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            client: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(GOOGLE_JWKS_URL)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "key endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cached = self.keys.read().await;
            if let Some(cached) = cached.as_ref() {
                if cached.fetched_at.elapsed() < KEY_CACHE_TTL {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return Ok(DecodingKey::from_jwk(jwk)?);
                    }
                }
            }
        }

        // Stale cache or rotated keys.
        let keys = self.fetch_keys().await?;
        tracing::debug!(count = keys.keys.len(), "refreshed identity provider signing keys");

        let key = keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()?
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown signing key {kid}")));

        *self.keys.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });

        key
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AuthError> {
        let header = decode_header(id_token)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);

        decode::<IdTokenClaims>(id_token, &key, &validation)?
            .claims
            .into_identity()
    }
}

// ============================================================================
// Local development (HS256, shared secret)
// ============================================================================

pub struct SharedSecretVerifier {
    secret: String,
}

impl SharedSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn mint(&self, uid: &str, email: &str, ttl: chrono::Duration) -> String {
        self.mint_with(uid, email, true, ttl)
    }

    #[cfg(test)]
    pub(crate) fn mint_with(&self, uid: &str, email: &str, email_verified: bool, ttl: chrono::Duration) -> String {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let now = chrono::Utc::now();
        let claims = IdTokenClaims {
            sub: uid.to_string(),
            email: Some(email.to_string()),
            email_verified,
            name: None,
            aud: DEV_TOKEN_AUDIENCE.to_string(),
            iss: DEV_TOKEN_ISSUER.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .unwrap()
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[DEV_TOKEN_AUDIENCE]);
        validation.set_issuer(&[DEV_TOKEN_ISSUER]);

        decode::<IdTokenClaims>(
            id_token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?
        .claims
        .into_identity()
    }
}
