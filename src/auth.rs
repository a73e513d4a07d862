//! Session tokens.
//!
//! Sessions are HS256-signed JWTs carrying the user id and email. The token is
//! issued by the sync and OAuth endpoints and verified by the session
//! middleware on every protected route.

use crate::db::User;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user id.
    pub user_id: String,
    /// Email at issue time.
    pub email: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

/// Identity attached to a request after the session was verified.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    /// User id.
    pub user_id: String,
    /// Current email.
    pub email: String,
    /// Current display name.
    pub name: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Token could not be signed.
    #[error("failed to sign session: {0}")]
    Sign(String),

    /// Token is malformed, tampered with or expired.
    #[error("invalid session: {0}")]
    Invalid(String),
}

/// Issues and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl SessionKeys {
    /// Creates keys from an HMAC secret and a token lifetime in hours.
    #[must_use]
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: i64::try_from(ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX),
        }
    }

    /// Issues a token for `user`. Returns the token and its expiry in unix
    /// seconds.
    pub fn issue(&self, user: &User) -> Result<(String, i64), SessionError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Sign(e.to_string()))?;
        Ok((token, claims.exp))
    }

    /// Verifies a token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, SessionError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| SessionError::Invalid(e.to_string()))
    }

    /// Signs arbitrary claims. Only used to forge expired tokens in tests.
    #[cfg(test)]
    pub(crate) fn sign(&self, claims: &Claims) -> String {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding_key).unwrap()
    }
}
