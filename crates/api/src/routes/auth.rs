//! Signup, login, and the current user.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{ApiJson, AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{SignupInput, UserProfile};
use crate::services::AuthSession;
use crate::state::AppState;

/// `POST /auth/signup` body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub user: SignupInput,
}

/// `POST /auth/login` body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A signed-in user and their bearer token.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub user: UserProfile,
    pub token: String,
}

impl SessionResponse {
    fn new(message: &'static str, session: &AuthSession) -> Self {
        Self {
            message,
            user: UserProfile::from(&session.user),
            token: session.token.clone(),
        }
    }
}

/// The current user's profile.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

/// Register an account and sign in.
///
/// POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let session = state.auth().register(request.user).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new("Account created successfully!", &session)),
    ))
}

/// Sign in with email and password.
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let session = state.auth().login(&request.email, &request.password).await?;
    tracing::info!(user_id = %session.user.id, "User logged in");
    Ok(Json(SessionResponse::new("Login successful!", &session)))
}

/// The user the bearer token belongs to.
///
/// GET /api/v1/auth/me
pub async fn me(OptionalAuth(user): OptionalAuth) -> Result<Json<MeResponse>> {
    let user = user.ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;
    Ok(Json(MeResponse {
        user: UserProfile::from(&user),
    }))
}
