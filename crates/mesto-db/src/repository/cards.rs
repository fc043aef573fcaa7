//! Card and like operations

use std::collections::HashMap;

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Card, CardId, NewCard, UserId};
use crate::repository::Database;
use crate::utils::parse_uuid;

impl Database {
    /// Insert a new card
    pub async fn insert_card(&self, card: NewCard) -> Result<Card, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO cards (id, name, link, owner, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&card.name)
        .bind(&card.link)
        .bind(card.owner.to_string())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| missing_user_or(e, card.owner))?;

        Ok(Card {
            id,
            name: card.name,
            link: card.link,
            owner: card.owner,
            likes: Vec::new(),
            created_at: now,
        })
    }

    /// Get a card by ID, with its likes
    pub async fn get_card_by_id(&self, id: CardId) -> Result<Option<Card>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, link, owner, created_at
            FROM cards
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut card = Card::try_from(&row)?;
        card.likes = self.get_card_likes(id).await?;
        Ok(Some(card))
    }

    /// List all cards, newest first, with their likes
    pub async fn list_cards(&self) -> Result<Vec<Card>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, link, owner, created_at
            FROM cards
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut cards = rows
            .iter()
            .map(Card::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let like_rows = sqlx::query("SELECT card_id, user_id FROM card_likes ORDER BY liked_at")
            .fetch_all(&self.pool)
            .await?;

        let mut likes: HashMap<CardId, Vec<UserId>> = HashMap::new();
        for row in &like_rows {
            let card_id = parse_uuid(&row.try_get::<String, _>("card_id")?)?;
            let user_id = parse_uuid(&row.try_get::<String, _>("user_id")?)?;
            likes.entry(card_id).or_default().push(user_id);
        }

        for card in &mut cards {
            if let Some(card_likes) = likes.remove(&card.id) {
                card.likes = card_likes;
            }
        }

        Ok(cards)
    }

    /// Delete a card; its likes go with it
    pub async fn delete_card(&self, id: CardId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add a like from a user. Liking twice is a no-op.
    pub async fn add_card_like(&self, card_id: CardId, user_id: UserId) -> Result<Card, DbError> {
        self.ensure_card_exists(card_id).await?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO card_likes (card_id, user_id, liked_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(card_id.to_string())
        .bind(user_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| missing_user_or(e, user_id))?;

        self.get_card_by_id(card_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Card: {}", card_id)))
    }

    /// Remove a like from a user. Removing an absent like is a no-op.
    pub async fn remove_card_like(&self, card_id: CardId, user_id: UserId) -> Result<Card, DbError> {
        self.ensure_card_exists(card_id).await?;

        sqlx::query("DELETE FROM card_likes WHERE card_id = ? AND user_id = ?")
            .bind(card_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        self.get_card_by_id(card_id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Card: {}", card_id)))
    }

    async fn get_card_likes(&self, card_id: CardId) -> Result<Vec<UserId>, DbError> {
        let rows = sqlx::query("SELECT user_id FROM card_likes WHERE card_id = ? ORDER BY liked_at")
            .bind(card_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let user_id: String = row.try_get("user_id")?;
                parse_uuid(&user_id).map_err(DbError::from)
            })
            .collect()
    }

    async fn ensure_card_exists(&self, card_id: CardId) -> Result<(), DbError> {
        let row = sqlx::query("SELECT 1 FROM cards WHERE id = ?")
            .bind(card_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(_) => Ok(()),
            None => Err(DbError::NotFound(format!("Card: {}", card_id))),
        }
    }
}

/// A token can outlive its user row; the foreign key then names a missing user
fn missing_user_or(err: sqlx::Error, user_id: UserId) -> DbError {
    if DbError::is_foreign_key_violation(&err) {
        DbError::NotFound(format!("User: {}", user_id))
    } else {
        DbError::Connection(err)
    }
}
