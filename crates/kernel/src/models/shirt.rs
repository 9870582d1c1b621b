//! Shirt model and CRUD operations.
//!
//! A shirt row is owned by exactly one user. Every mutating query is scoped by
//! `owner_id`, so a caller can only touch their own rows; a row that exists but
//! belongs to somebody else is indistinguishable from a missing one.

use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Columns selected for a shirt row, in table order.
pub const SHIRT_COLUMNS: &str = "id, owner_id, team, player, season, photo_uri, purchase_details, \
     estimated_value, personal_notes, external_ref, is_public, created";

/// Catalogued shirt.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shirt {
    /// Unique identifier (UUIDv7, so id order is insertion order).
    pub id: Uuid,

    /// Owning user. Bound from the session, never from the request body.
    pub owner_id: Uuid,

    /// Team or club name.
    pub team: String,

    /// Player name.
    pub player: String,

    /// Season label, free-form ("1998/99", "2021-2022").
    pub season: String,

    /// Storage URI of the photo.
    pub photo_uri: String,

    /// Where, when and for how much the shirt was bought.
    pub purchase_details: Option<String>,

    /// Estimated value, two fractional digits, never negative.
    pub estimated_value: Option<Decimal>,

    /// Private notes and history of the shirt.
    pub personal_notes: Option<String>,

    /// Link or reference to an external source.
    pub external_ref: Option<String>,

    /// Shown in the public showcase.
    pub is_public: bool,

    /// Set once at insert time.
    pub created: DateTime<Utc>,
}

/// Editable fields of a shirt, already validated.
///
/// Owner and creation timestamp are not part of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShirtInput {
    pub team: String,
    pub player: String,
    pub season: String,
    pub purchase_details: Option<String>,
    pub estimated_value: Option<Decimal>,
    pub personal_notes: Option<String>,
    pub external_ref: Option<String>,
    pub is_public: bool,
}

impl fmt::Display for Shirt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.team, self.player, self.season)
    }
}

impl Shirt {
    /// Check whether `user_id` owns this shirt.
    pub fn is_owned_by(&self, user_id: Option<Uuid>) -> bool {
        user_id == Some(self.owner_id)
    }

    /// Find a shirt by ID regardless of visibility.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let shirt = sqlx::query_as::<_, Shirt>(&format!(
            "SELECT {SHIRT_COLUMNS} FROM shirt WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch shirt by id")?;

        Ok(shirt)
    }

    /// Find a shirt the viewer may see: public ones, or private ones they own.
    pub async fn find_visible(
        pool: &PgPool,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Option<Self>> {
        let shirt = sqlx::query_as::<_, Shirt>(&format!(
            "SELECT {SHIRT_COLUMNS} FROM shirt WHERE id = $1 AND (is_public OR owner_id = $2)"
        ))
        .bind(id)
        .bind(viewer)
        .fetch_optional(pool)
        .await
        .context("failed to fetch visible shirt")?;

        Ok(shirt)
    }

    /// Find a shirt owned by `owner_id`.
    pub async fn find_owned(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<Option<Self>> {
        let shirt = sqlx::query_as::<_, Shirt>(&format!(
            "SELECT {SHIRT_COLUMNS} FROM shirt WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch owned shirt")?;

        Ok(shirt)
    }

    /// List every shirt of an owner, newest first.
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>> {
        let shirts = sqlx::query_as::<_, Shirt>(&format!(
            "SELECT {SHIRT_COLUMNS} FROM shirt WHERE owner_id = $1 ORDER BY id DESC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .context("failed to list shirts by owner")?;

        Ok(shirts)
    }

    /// Create a shirt owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        input: &ShirtInput,
        photo_uri: &str,
    ) -> Result<Self> {
        let id = Uuid::now_v7();

        let shirt = sqlx::query_as::<_, Shirt>(&format!(
            r#"
            INSERT INTO shirt (id, owner_id, team, player, season, photo_uri, purchase_details,
                               estimated_value, personal_notes, external_ref, is_public, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
            RETURNING {SHIRT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&input.team)
        .bind(&input.player)
        .bind(&input.season)
        .bind(photo_uri)
        .bind(&input.purchase_details)
        .bind(input.estimated_value)
        .bind(&input.personal_notes)
        .bind(&input.external_ref)
        .bind(input.is_public)
        .fetch_one(pool)
        .await
        .context("failed to insert shirt")?;

        Ok(shirt)
    }

    /// Replace the editable fields of an owned shirt.
    ///
    /// `photo_uri` of `None` keeps the current photo. Returns `None` when the
    /// shirt does not exist or is not owned by `owner_id`.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        input: &ShirtInput,
        photo_uri: Option<&str>,
    ) -> Result<Option<Self>> {
        let shirt = sqlx::query_as::<_, Shirt>(&format!(
            r#"
            UPDATE shirt SET
                team = $1,
                player = $2,
                season = $3,
                photo_uri = COALESCE($4, photo_uri),
                purchase_details = $5,
                estimated_value = $6,
                personal_notes = $7,
                external_ref = $8,
                is_public = $9
            WHERE id = $10 AND owner_id = $11
            RETURNING {SHIRT_COLUMNS}
            "#
        ))
        .bind(&input.team)
        .bind(&input.player)
        .bind(&input.season)
        .bind(photo_uri)
        .bind(&input.purchase_details)
        .bind(input.estimated_value)
        .bind(&input.personal_notes)
        .bind(&input.external_ref)
        .bind(input.is_public)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .context("failed to update shirt")?;

        Ok(shirt)
    }

    /// Delete an owned shirt. Returns `false` when nothing matched.
    pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shirt WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await
            .context("failed to delete shirt")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Shirt {
        Shirt {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            team: "AS Roma".to_string(),
            player: "Totti".to_string(),
            season: "2000/01".to_string(),
            photo_uri: "local://shirts/2025/12/abcd1234_totti.jpg".to_string(),
            purchase_details: None,
            estimated_value: None,
            personal_notes: None,
            external_ref: None,
            is_public: false,
            created: Utc::now(),
        }
    }

    #[test]
    fn display_reads_team_player_season() {
        assert_eq!(sample().to_string(), "AS Roma - Totti (2000/01)");
    }

    #[test]
    fn ownership_check() {
        let shirt = sample();
        assert!(shirt.is_owned_by(Some(shirt.owner_id)));
        assert!(!shirt.is_owned_by(Some(Uuid::now_v7())));
        assert!(!shirt.is_owned_by(None));
    }

    #[test]
    fn default_input_is_private() {
        assert!(!ShirtInput::default().is_public);
    }
}
