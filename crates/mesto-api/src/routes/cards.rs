//! Photo card routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use mesto_auth::AuthUser;
use mesto_db::NewCard;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

use super::types::{CardResponse, CreateCardRequest, MessageResponse};
use super::validation::{validate_text, validate_url};

/// GET /cards
async fn list_cards(State(state): State<AppState>) -> Result<Json<Vec<CardResponse>>, ApiError> {
    let cards = state.db.list_cards().await?;
    Ok(Json(cards.into_iter().map(CardResponse::from).collect()))
}

/// POST /cards
async fn create_card(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), ApiError> {
    validate_text("name", &request.name)?;
    validate_url("link", &request.link)?;

    let card = state
        .db
        .insert_card(NewCard {
            name: request.name,
            link: request.link,
            owner: user.id,
        })
        .await?;

    debug!("User {} created card {}", user.id, card.id);

    Ok((StatusCode::CREATED, Json(CardResponse::from(card))))
}

/// DELETE /cards/{cardId}
///
/// Only the card's owner may delete it.
async fn delete_card(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(card_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let card = state
        .db
        .get_card_by_id(card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))?;

    if card.owner != user.id {
        return Err(ApiError::Forbidden(
            "Cannot delete another user's card".to_string(),
        ));
    }

    if !state.db.delete_card(card_id).await? {
        return Err(ApiError::NotFound("Card not found".to_string()));
    }

    info!("User {} deleted card {}", user.id, card_id);

    Ok(Json(MessageResponse {
        message: "Card deleted".to_string(),
    }))
}

/// PUT /cards/{cardId}/likes
async fn like_card(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(card_id): ApiPath<Uuid>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = state.db.add_card_like(card_id, user.id).await?;
    Ok(Json(CardResponse::from(card)))
}

/// DELETE /cards/{cardId}/likes
async fn unlike_card(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(card_id): ApiPath<Uuid>,
) -> Result<Json<CardResponse>, ApiError> {
    let card = state.db.remove_card_like(card_id, user.id).await?;
    Ok(Json(CardResponse::from(card)))
}

/// Create card routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/{cardId}", delete(delete_card))
        .route("/cards/{cardId}/likes", delete(unlike_card).put(like_card))
}
