//! Card listings: browse, search, CRUD, sale state, and image upload.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use rinkside_core::CardId;

use crate::db::{CardRepository, UserRepository};
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::query::SEARCH_LIMIT;
use crate::models::{
    Card, CardDraft, CardInput, CardQuery, CardResponse, PaginationMeta, ToggleSaleInput, User,
    UserProfile,
};
use crate::services::ImageUpload;
use crate::state::AppState;

const CARD_NOT_FOUND: &str = "Card not found";

/// `{"card": {...}}` request body.
#[derive(Debug, Deserialize)]
pub struct CardRequest {
    pub card: CardInput,
}

/// A page of cards.
#[derive(Debug, Serialize)]
pub struct CardPage {
    pub cards: Vec<CardResponse>,
    pub pagination: PaginationMeta,
}

/// An unpaginated list of cards.
#[derive(Debug, Serialize)]
pub struct CardList {
    pub cards: Vec<CardResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// A single card.
#[derive(Debug, Serialize)]
pub struct CardBody {
    pub card: CardResponse,
}

/// A card with an action message.
#[derive(Debug, Serialize)]
pub struct CardMessage {
    pub message: &'static str,
    pub card: CardResponse,
}

/// A bare action message.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Result of an image upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub image_url: String,
    pub public_id: String,
}

fn current_year() -> i32 {
    Utc::now().year()
}

fn responses(cards: Vec<Card>) -> Vec<CardResponse> {
    cards.into_iter().map(CardResponse::from).collect()
}

/// Load a card the caller owns.
async fn owned_card(state: &AppState, id: CardId, user: &User) -> Result<Card> {
    let card = CardRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(CARD_NOT_FOUND.into()))?;

    if card.owner_id != user.id {
        tracing::warn!(card_id = %id, user_id = %user.id, "Card ownership check failed");
        return Err(AppError::Forbidden);
    }
    Ok(card)
}

/// Filtered, sorted, paginated listing.
///
/// GET /api/v1/cards
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CardQuery>,
) -> Result<Json<CardPage>> {
    let page = query.pagination();
    let (cards, total) = CardRepository::new(state.pool())
        .list(&query.filter(), query.sort(), page)
        .await?;

    Ok(Json(CardPage {
        cards: responses(cards),
        pagination: page.meta(total),
    }))
}

/// For-sale listing.
///
/// GET /api/v1/cards/marketplace
pub async fn marketplace(
    State(state): State<AppState>,
    Query(query): Query<CardQuery>,
) -> Result<Json<CardPage>> {
    let mut filter = query.filter();
    filter.for_sale = true;

    let page = query.pagination();
    let (cards, total) = CardRepository::new(state.pool())
        .list(&filter, query.sort(), page)
        .await?;

    Ok(Json(CardPage {
        cards: responses(cards),
        pagination: page.meta(total),
    }))
}

/// The caller's cards, unpaginated.
///
/// GET /api/v1/cards/my_cards
pub async fn my_cards(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CardQuery>,
) -> Result<Json<CardList>> {
    let mut filter = query.filter();
    filter.owner_id = Some(user.id);

    let cards = CardRepository::new(state.pool())
        .list_all(&filter, query.sort())
        .await?;

    Ok(Json(CardList {
        cards: responses(cards),
        query: None,
    }))
}

/// Free-text search, narrowed by the listing filters.
///
/// GET /api/v1/cards/search
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<CardQuery>,
) -> Result<Json<CardList>> {
    let Some(text) = query.search_text() else {
        return Ok(Json(CardList {
            cards: Vec::new(),
            query: None,
        }));
    };

    let mut filter = query.filter();
    filter.search = Some(text.clone());

    let cards = CardRepository::new(state.pool())
        .search(&filter, query.sort(), SEARCH_LIMIT)
        .await?;

    Ok(Json(CardList {
        cards: responses(cards),
        query: Some(text),
    }))
}

/// Card detail with its owner. Every successful fetch counts as a view.
///
/// GET /api/v1/cards/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CardId>,
) -> Result<Json<CardBody>> {
    let card = CardRepository::new(state.pool())
        .view(id)
        .await?
        .ok_or_else(|| AppError::NotFound(CARD_NOT_FOUND.into()))?;

    let owner = UserRepository::new(state.pool())
        .get_by_id(card.owner_id)
        .await?;

    let mut response = CardResponse::from(card);
    if let Some(owner) = owner {
        response = response.with_owner(UserProfile::from(&owner));
    }
    Ok(Json(CardBody { card: response }))
}

/// Create a listing owned by the caller.
///
/// POST /api/v1/cards
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CardRequest>,
) -> Result<(StatusCode, Json<CardMessage>)> {
    let mut draft = CardDraft::new();
    draft.apply(request.card);
    let fields = draft
        .validate(current_year())
        .map_err(|e| AppError::validation("Failed to create card", e))?;

    let card = CardRepository::new(state.pool())
        .create(user.id, &fields)
        .await?;
    tracing::info!(card_id = %card.id, owner_id = %user.id, "Card created");

    Ok((
        StatusCode::CREATED,
        Json(CardMessage {
            message: "Card created successfully",
            card: card.into(),
        }),
    ))
}

/// Partially update a listing.
///
/// PATCH/PUT /api/v1/cards/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CardId>,
    ApiJson(request): ApiJson<CardRequest>,
) -> Result<Json<CardMessage>> {
    let card = owned_card(&state, id, &user).await?;

    let mut draft = CardDraft::from(card.fields);
    draft.apply(request.card);
    let fields = draft
        .validate(current_year())
        .map_err(|e| AppError::validation("Failed to update card", e))?;

    let card = CardRepository::new(state.pool())
        .update(id, &fields)
        .await?;

    Ok(Json(CardMessage {
        message: "Card updated successfully",
        card: card.into(),
    }))
}

/// Delete a listing.
///
/// DELETE /api/v1/cards/{id}
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CardId>,
) -> Result<Json<Message>> {
    owned_card(&state, id, &user).await?;
    CardRepository::new(state.pool()).delete(id).await?;
    tracing::info!(card_id = %id, "Card deleted");

    Ok(Json(Message {
        message: "Card deleted successfully",
    }))
}

/// Flip a listing's sale state.
///
/// Turning sale on uses the supplied asking price, or keeps the existing
/// one. Turning it off clears the price. The body is optional.
///
/// POST /api/v1/cards/{id}/toggle_sale
pub async fn toggle_sale(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CardId>,
    body: Bytes,
) -> Result<Json<CardMessage>> {
    let input: ToggleSaleInput = if body.iter().all(u8::is_ascii_whitespace) {
        ToggleSaleInput::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };

    let card = owned_card(&state, id, &user).await?;

    let mut fields = card.fields;
    fields
        .toggle_sale(input.asking_price)
        .map_err(|e| AppError::validation("Failed to update sale status", e))?;

    let card = CardRepository::new(state.pool())
        .update(id, &fields)
        .await?;

    let message = if card.fields.for_sale {
        "Card listed for sale"
    } else {
        "Card removed from sale"
    };
    tracing::info!(card_id = %id, for_sale = card.fields.for_sale, "Sale status changed");

    Ok(Json(CardMessage {
        message,
        card: card.into(),
    }))
}

/// Upload a card image to the media store.
///
/// POST /api/v1/cards/upload_image (multipart, field `image`)
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if !bytes.is_empty() {
            upload = Some(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        }
        break;
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("No image file provided".into()))?;
    let image = state.media().upload(upload).await?;

    Ok(Json(UploadResponse {
        message: "Image uploaded successfully",
        image_url: image.secure_url,
        public_id: image.public_id,
    }))
}
