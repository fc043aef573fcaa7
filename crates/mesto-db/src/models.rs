//! Database models

use crate::utils::{parse_datetime_or_now, parse_uuid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// Identifier of a user record
pub type UserId = Uuid;

/// Identifier of a card record
pub type CardId = Uuid;

/// Default display name for accounts created without one
pub const DEFAULT_USER_NAME: &str = "Jacques-Yves Cousteau";
/// Default "about" line for accounts created without one
pub const DEFAULT_USER_ABOUT: &str = "Explorer";
/// Default avatar for accounts created without one
pub const DEFAULT_USER_AVATAR: &str =
    "https://pictures.s3.yandex.net/resources/jacques-cousteau_1604399756.png";

/// User profile. The password hash only travels inside a [`CredentialRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub about: String,
    pub avatar: String,
    pub email: String,
    pub password_hash: String,
}

/// Stored credentials for a user, as consulted during login
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub user: User,
    pub password_hash: String,
}

/// Profile fields a user may change on their own account
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub about: Option<String>,
}

/// Photo card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub link: String,
    pub owner: UserId,
    pub likes: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

/// New card for insertion
#[derive(Debug, Clone)]
pub struct NewCard {
    pub name: String,
    pub link: String,
    pub owner: UserId,
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            name: row.try_get("name")?,
            about: row.try_get("about")?,
            avatar: row.try_get("avatar")?,
            email: row.try_get("email")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for CredentialRecord {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(CredentialRecord {
            user: User::try_from(row)?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

/// Card row without its likes; likes live in their own table
impl TryFrom<&sqlx::sqlite::SqliteRow> for Card {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Card {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            name: row.try_get("name")?,
            link: row.try_get("link")?,
            owner: parse_uuid(&row.try_get::<String, _>("owner")?)?,
            likes: Vec::new(),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}
