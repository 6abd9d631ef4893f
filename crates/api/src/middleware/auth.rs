//! Bearer authentication extractors.
//!
//! Token resolution is the pure [`bearer_user_id`]; the extractors add the
//! user lookup and map failures to responses.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use rinkside_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::models::user::User;
use crate::services::auth::{AuthError, TokenIssuer};
use crate::state::AppState;

/// Resolve the `Authorization: Bearer <token>` header to a user ID.
///
/// # Errors
///
/// Returns `AuthError::NotAuthenticated` if the header is missing or not a
/// bearer credential, and `AuthError::Token` if the token does not verify.
pub fn bearer_user_id(headers: &HeaderMap, tokens: &TokenIssuer) -> Result<UserId, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::NotAuthenticated)?;

    let token = value
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::NotAuthenticated)?;

    Ok(tokens.verify(token)?)
}

/// Load the caller, `None` when the request carries no valid credential.
async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let user_id = match bearer_user_id(&parts.headers, state.tokens()) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(error = %e, "No authenticated user");
            return Ok(None);
        }
    };

    match state.auth().user(user_id).await {
        Ok(user) => {
            set_sentry_user(&user.id);
            Ok(Some(user))
        }
        Err(AuthError::NotAuthenticated) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.full_name())
/// }
/// ```
pub struct RequireAuth(pub User);

/// Error returned when authentication is required but missing.
#[derive(Debug)]
pub enum AuthRejection {
    /// No valid bearer token, or its user no longer exists.
    Unauthorized,
    /// The user lookup itself failed.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state)
            .await
            .map_err(AuthRejection::Failed)?
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, an absent or invalid token yields `None`.
pub struct OptionalAuth(pub Option<User>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state).await.map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from(
            "k7Qp2Lx9Vb4Nz8Rt1Wm6Yc3Hd5Fg0Js2".to_string(),
        ))
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_bearer() {
        let tokens = issuer();
        let token = tokens.issue(UserId::new(42)).unwrap();
        let id = bearer_user_id(&headers(&format!("Bearer {token}")), &tokens).unwrap();
        assert_eq!(id, UserId::new(42));

        let id = bearer_user_id(&headers(&format!("bearer {token}")), &tokens).unwrap();
        assert_eq!(id, UserId::new(42));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            bearer_user_id(&HeaderMap::new(), &issuer()),
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_wrong_scheme() {
        let tokens = issuer();
        let token = tokens.issue(UserId::new(1)).unwrap();
        for value in [token.clone(), format!("Basic {token}"), "Bearer ".to_string()] {
            assert!(
                matches!(
                    bearer_user_id(&headers(&value), &tokens),
                    Err(AuthError::NotAuthenticated)
                ),
                "{value}"
            );
        }
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            bearer_user_id(&headers("Bearer not.a.jwt"), &issuer()),
            Err(AuthError::Token(_))
        ));
    }

    #[test]
    fn test_token_from_other_secret() {
        let other = TokenIssuer::new(&SecretString::from(
            "Zx8Cv7Bn6Mq5Wa4Es3Rd2Tf1Yg0Uh9Ij8".to_string(),
        ));
        let token = other.issue(UserId::new(1)).unwrap();
        assert!(bearer_user_id(&headers(&format!("Bearer {token}")), &issuer()).is_err());
    }
}
