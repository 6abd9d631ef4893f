//! Seller delivery options.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use rinkside_core::{DeliveryOptionId, UserId};

use crate::db::{DeliveryOptionRepository, RepositoryError};
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{
    DeliveryOption, DeliveryOptionFields, DeliveryOptionInput, DeliveryOptionResponse, User,
    ValidationErrors,
};
use crate::state::AppState;

const NOT_FOUND: &str = "Delivery option not found";

/// `{"delivery_option": {...}}` request body.
#[derive(Debug, Deserialize)]
pub struct DeliveryOptionRequest {
    pub delivery_option: DeliveryOptionInput,
}

/// A list of delivery options.
#[derive(Debug, Serialize)]
pub struct DeliveryOptionList {
    pub delivery_options: Vec<DeliveryOptionResponse>,
}

/// A single delivery option.
#[derive(Debug, Serialize)]
pub struct DeliveryOptionBody {
    pub delivery_option: DeliveryOptionResponse,
}

/// A delivery option with an action message.
#[derive(Debug, Serialize)]
pub struct DeliveryOptionMessage {
    pub message: &'static str,
    pub delivery_option: DeliveryOptionResponse,
}

/// A bare action message.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

fn list(options: Vec<DeliveryOption>) -> Json<DeliveryOptionList> {
    Json(DeliveryOptionList {
        delivery_options: options.into_iter().map(Into::into).collect(),
    })
}

/// Load an option the caller offers.
async fn owned_option(
    state: &AppState,
    id: DeliveryOptionId,
    user: &User,
) -> Result<DeliveryOption> {
    let option = DeliveryOptionRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;

    if option.seller_id != user.id {
        return Err(AppError::Forbidden);
    }
    Ok(option)
}

/// A duplicate name is a validation failure, not a server error.
fn save_error(summary: &str, err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict(_) => {
            AppError::validation(summary, ValidationErrors::single("name", "has already been taken"))
        }
        other => other.into(),
    }
}

/// The caller's options, oldest first.
///
/// GET /api/v1/delivery_options
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<DeliveryOptionList>> {
    let options = DeliveryOptionRepository::new(state.pool())
        .list_by_seller(user.id)
        .await?;
    Ok(list(options))
}

/// A seller's options, cheapest first. Public.
///
/// GET /api/v1/delivery_options/for_seller/{seller_id}
pub async fn for_seller(
    State(state): State<AppState>,
    ApiPath(seller_id): ApiPath<UserId>,
) -> Result<Json<DeliveryOptionList>> {
    let options = DeliveryOptionRepository::new(state.pool())
        .list_by_seller_price(seller_id)
        .await?;
    Ok(list(options))
}

/// GET /api/v1/delivery_options/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<DeliveryOptionId>,
) -> Result<Json<DeliveryOptionBody>> {
    let option = owned_option(&state, id, &user).await?;
    Ok(Json(DeliveryOptionBody {
        delivery_option: option.into(),
    }))
}

/// POST /api/v1/delivery_options
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<DeliveryOptionRequest>,
) -> Result<(StatusCode, Json<DeliveryOptionMessage>)> {
    const SUMMARY: &str = "Failed to create delivery option";

    let fields: DeliveryOptionFields = request
        .delivery_option
        .validate(None)
        .map_err(|e| AppError::validation(SUMMARY, e))?;

    let option = DeliveryOptionRepository::new(state.pool())
        .create(user.id, &fields)
        .await
        .map_err(|e| save_error(SUMMARY, e))?;

    Ok((
        StatusCode::CREATED,
        Json(DeliveryOptionMessage {
            message: "Delivery option created successfully",
            delivery_option: option.into(),
        }),
    ))
}

/// PATCH/PUT /api/v1/delivery_options/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<DeliveryOptionId>,
    ApiJson(request): ApiJson<DeliveryOptionRequest>,
) -> Result<Json<DeliveryOptionMessage>> {
    const SUMMARY: &str = "Failed to update delivery option";

    let current = owned_option(&state, id, &user).await?;
    let fields = request
        .delivery_option
        .validate(Some(&current))
        .map_err(|e| AppError::validation(SUMMARY, e))?;

    let option = DeliveryOptionRepository::new(state.pool())
        .update(id, &fields)
        .await
        .map_err(|e| save_error(SUMMARY, e))?;

    Ok(Json(DeliveryOptionMessage {
        message: "Delivery option updated successfully",
        delivery_option: option.into(),
    }))
}

/// DELETE /api/v1/delivery_options/{id}
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<DeliveryOptionId>,
) -> Result<Json<Message>> {
    owned_option(&state, id, &user).await?;
    DeliveryOptionRepository::new(state.pool()).delete(id).await?;

    Ok(Json(Message {
        message: "Delivery option deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_is_validation_error() {
        let err = save_error(
            "Failed to create delivery option",
            RepositoryError::Conflict("Name has already been taken".into()),
        );
        assert!(matches!(
            err,
            AppError::Validation { details, .. } if details == ["Name has already been taken"]
        ));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = save_error("Failed", RepositoryError::NotFound);
        assert!(matches!(err, AppError::Database(RepositoryError::NotFound)));
    }
}
