//! Bearer token issuance and verification (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rinkside_core::UserId;

/// Token lifetime.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Errors issuing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token has expired.
    #[error("token expired")]
    Expired,

    /// The token is malformed or its signature does not verify.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Encoding failed.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: i32,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Signs and verifies bearer tokens with the configured secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").field("keys", &"[REDACTED]").finish()
    }
}

impl TokenIssuer {
    /// Create an issuer from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a token for `user_id`, valid for [`TOKEN_TTL_HOURS`].
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: user_id.as_i32(),
            exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for expired tokens and
    /// `TokenError::Invalid` for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;
        Ok(UserId::new(data.claims.user_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&SecretString::from(secret.to_string()))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = issuer("k3y-for-tests-0123456789abcdefXYZ");
        let token = tokens.issue(UserId::new(42)).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer("first-secret-0123456789abcdefXYZ")
            .issue(UserId::new(1))
            .unwrap();
        let result = issuer("other-secret-0123456789abcdefXYZ").verify(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = issuer("k3y-for-tests-0123456789abcdefXYZ");
        let token = tokens
            .sign(&Claims {
                user_id: 1,
                exp: Utc::now().timestamp() - 10,
            })
            .unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = issuer("k3y-for-tests-0123456789abcdefXYZ");
        assert!(matches!(tokens.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(tokens.verify(""), Err(TokenError::Invalid(_))));
    }
}
