//! User profile routes

use axum::{
    Json, Router,
    extract::State,
    routing::{get, patch},
};
use mesto_auth::AuthUser;
use mesto_db::ProfileUpdate;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

use super::types::{UpdateAvatarRequest, UpdateProfileRequest, UserResponse};
use super::validation::{validate_text, validate_url};

/// GET /users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/me
async fn get_current_user(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    find_user(&state, user.id).await
}

/// GET /users/{userId}
async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    find_user(&state, id).await
}

async fn find_user(state: &AppState, id: Uuid) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// PATCH /users/me
async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(name) = &request.name {
        validate_text("name", name)?;
    }
    if let Some(about) = &request.about {
        validate_text("about", about)?;
    }

    debug!("Updating profile of user {}", user.id);

    let updated = state
        .db
        .update_user_profile(
            user.id,
            ProfileUpdate {
                name: request.name,
                about: request.about,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// PATCH /users/me/avatar
async fn update_avatar(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateAvatarRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_url("avatar", &request.avatar)?;

    debug!("Updating avatar of user {}", user.id);

    let updated = state.db.update_user_avatar(user.id, &request.avatar).await?;
    Ok(Json(UserResponse::from(updated)))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(get_current_user).patch(update_profile))
        .route("/users/me/avatar", patch(update_avatar))
        .route("/users/{userId}", get(get_user))
}
