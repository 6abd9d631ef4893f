//! Site preference endpoints.

use axum::{Json, extract::State};

use crate::db::PreferenceRepository;
use crate::error::{ApiJson, AppError, Result};
use crate::models::{FavoriteNumberInput, FavoriteNumberResponse};
use crate::state::AppState;

/// GET /api/v1/preferences/favorite_number
pub async fn favorite_number(State(state): State<AppState>) -> Result<Json<FavoriteNumberResponse>> {
    let preference = PreferenceRepository::new(state.pool()).get().await?;
    Ok(Json(FavoriteNumberResponse::current(&preference)))
}

/// POST /api/v1/preferences/favorite_number
pub async fn update_favorite_number(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<FavoriteNumberInput>,
) -> Result<Json<FavoriteNumberResponse>> {
    let number = input.positive().ok_or_else(|| AppError::Validation {
        error: "Please enter a valid positive number".into(),
        details: Vec::new(),
    })?;

    let preference = PreferenceRepository::new(state.pool())
        .set_favorite_number(number)
        .await?;
    tracing::info!(favorite_number = number, "Favorite number updated");
    Ok(Json(FavoriteNumberResponse::updated(&preference)))
}
