//! Request/Response DTOs

use chrono::{DateTime, Utc};
use mesto_db::{Card, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==================== Auth Types ====================

/// Account creation request
#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub about: Option<String>,
    pub avatar: Option<String>,
    pub email: String,
    pub password: String,
}

/// Sign-in request
#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Sign-in response: the caller's profile plus the issued token
#[derive(Serialize)]
pub struct SigninResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub expires_in: i64,
}

/// Plain acknowledgement
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ==================== User Types ====================

/// Profile update request
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub about: Option<String>,
}

/// Avatar update request
#[derive(Deserialize)]
pub struct UpdateAvatarRequest {
    pub avatar: String,
}

/// Public user profile (never includes the password hash)
#[derive(Serialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            about: user.about,
            avatar: user.avatar,
            email: user.email,
        }
    }
}

// ==================== Card Types ====================

/// Card creation request
#[derive(Deserialize)]
pub struct CreateCardRequest {
    pub name: String,
    pub link: String,
}

/// Card response
#[derive(Serialize)]
pub struct CardResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub link: String,
    pub owner: Uuid,
    pub likes: Vec<Uuid>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            name: card.name,
            link: card.link,
            owner: card.owner,
            likes: card.likes,
            created_at: card.created_at,
        }
    }
}
