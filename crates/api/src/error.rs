//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//! Every error body is JSON: `{"error": "..."}`, plus `details` for
//! validation and upstream failures.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationErrors;
use crate::services::auth::{AuthError, TokenError};
use crate::services::media::MediaError;
use crate::services::payments::PaymentError;

/// Message returned in place of any server-side detail.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation.
    #[error("{error}: {}", .details.join(", "))]
    Validation { error: String, details: Vec<String> },

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller does not own the resource.
    #[error("Unauthorized")]
    Forbidden,

    /// Bad request from client, including payment gateway rejections.
    #[error("{0}")]
    BadRequest(String),

    /// An upstream service failed; its message is passed through.
    #[error("{error}: {details}")]
    Upstream { error: String, details: String },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A 422 with itemized messages under a summary.
    pub fn validation(error: impl Into<String>, errors: ValidationErrors) -> Self {
        Self::Validation {
            error: error.into(),
            details: errors.into_messages(),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation { error, details } if details.is_empty() => json!({ "error": error }),
            Self::Validation { error, details } => json!({ "error": error, "details": details }),
            Self::Upstream { error, details } => json!({ "error": error, "details": [details] }),
            Self::Database(_) | Self::Internal(_) => json!({ "error": INTERNAL_MESSAGE }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::validation("Failed to create account", errors),
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid email or password".into()),
            AuthError::NotAuthenticated
            | AuthError::Token(TokenError::Expired | TokenError::Invalid(_)) => {
                Self::Unauthorized("Not authenticated".into())
            }
            AuthError::Repository(e) => Self::Database(e),
            AuthError::Token(e @ TokenError::Encoding(_)) => Self::Internal(e.to_string()),
            AuthError::PasswordHash => Self::Internal("password hashing failed".into()),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(message) => Self::NotFound(message.into()),
            PaymentError::BadRequest(message) => Self::BadRequest(message),
            PaymentError::Stripe(e) => Self::BadRequest(e.to_string()),
            PaymentError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Invalid(errors) => Self::validation("Failed to upload image", errors),
            other => Self::Upstream {
                error: "Failed to upload image".into(),
                details: other.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Path rejected");
        Self::NotFound("Not found".into())
    }
}

/// JSON body extractor whose rejections use the API error format.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the API error format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::stripe::StripeError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("Card not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("test".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::BadRequest("test".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::validation("Failed", ValidationErrors::single("name", "can't be blank"))
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Internal("test".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body() {
        let err = AppError::validation(
            "Failed to create card",
            ValidationErrors::single("player_name", "can't be blank"),
        );
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({"error": "Failed to create card", "details": ["Player name can't be blank"]})
        );
    }

    #[tokio::test]
    async fn test_internal_detail_hidden() {
        let (status, body) = body_json(AppError::Internal("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_forbidden_body() {
        let (status, body) = body_json(AppError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Unauthorized"}));
    }

    #[tokio::test]
    async fn test_gateway_message_passed_through() {
        let err: AppError = PaymentError::Stripe(StripeError::Api {
            status: 400,
            message: "No such account".into(),
        })
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No such account"}));
    }

    #[tokio::test]
    async fn test_upload_failure_details() {
        let err: AppError = MediaError::Upstream("Invalid image file".into()).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "Failed to upload image", "details": ["Invalid image file"]})
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(
            AppError::from(AuthError::InvalidCredentials),
            AppError::Unauthorized(msg) if msg == "Invalid email or password"
        ));
        assert!(matches!(
            AppError::from(AuthError::Token(TokenError::Expired)),
            AppError::Unauthorized(msg) if msg == "Not authenticated"
        ));
        assert!(matches!(
            AppError::from(AuthError::Validation(ValidationErrors::single(
                "email",
                "has already been taken"
            ))),
            AppError::Validation { error, details }
                if error == "Failed to create account"
                    && details == ["Email has already been taken"]
        ));
    }
}
