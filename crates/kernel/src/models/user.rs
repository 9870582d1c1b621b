//! Collector accounts.
//!
//! Passwords are stored as Argon2id PHC strings. Hashing and verification
//! are CPU-bound and run on the blocking pool.

use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, pass, mail, created";

/// A registered collector.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    /// Unique login and display name.
    pub name: String,
    /// Argon2 hash, never rendered.
    #[serde(skip_serializing)]
    pub pass: String,
    pub mail: String,
    pub created: DateTime<Utc>,
}

/// Validated registration details, password still in clear text.
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub mail: String,
    pub password: String,
}

impl User {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to load user")
    }

    /// Exact, case-sensitive lookup by login name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1"))
            .bind(name)
            .fetch_optional(pool)
            .await
            .context("failed to look up user by name")
    }

    /// Whether a login name is taken, ignoring case.
    pub async fn name_exists(pool: &PgPool, name: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(name) = LOWER($1))")
            .bind(name)
            .fetch_one(pool)
            .await
            .context("failed to check username")
    }

    /// Hash the password and store the account.
    pub async fn create(pool: &PgPool, input: NewUser) -> Result<Self> {
        let NewUser {
            name,
            mail,
            password,
        } = input;
        let pass = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task failed")??;

        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, pass, mail) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&name)
        .bind(&pass)
        .bind(&mail)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to insert user {name}"))
    }

    /// The user named `name`, if `password` matches their hash.
    pub async fn authenticate(pool: &PgPool, name: &str, password: &str) -> Result<Option<Self>> {
        let Some(user) = Self::find_by_name(pool, name).await? else {
            return Ok(None);
        };

        let password = password.to_string();
        tokio::task::spawn_blocking(move || user.verify_password(&password).then_some(user))
            .await
            .context("password verification task failed")
    }

    /// Check a clear-text password against the stored hash. An empty or
    /// unparseable hash never matches.
    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.pass)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))
}
