//! Kitbag test utilities.
//!
//! Helpers for integration testing: fixture builders that insert users and
//! shirts straight into PostgreSQL, a multipart body builder for the upload
//! forms, and assertion utilities.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher};
use sqlx::PgPool;
use uuid::Uuid;

/// Password every fixture user is created with.
pub const TEST_PASSWORD: &str = "curva-sud-1927";

/// Smallest byte sequence recognised as a PNG.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52,
];

/// Name with a random suffix, so fixtures never collide across test runs.
pub fn unique_name(prefix: &str) -> String {
    let id = Uuid::now_v7().simple().to_string();
    format!("{prefix}_{}", &id[id.len() - 12..])
}

/// Create a test user with a unique name and [`TEST_PASSWORD`].
pub fn test_user(prefix: &str) -> TestUser {
    let name = unique_name(prefix);
    TestUser {
        id: Uuid::now_v7(),
        mail: format!("{name}@example.com"),
        name,
        password: TEST_PASSWORD.to_string(),
    }
}

/// A test user builder.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub mail: String,
    pub password: String,
}

impl TestUser {
    /// Set a custom password.
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    /// Insert the user, hashing the password with Argon2id.
    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(self.password.as_bytes(), &salt)
            .map_err(|e| sqlx::Error::Protocol(format!("failed to hash password: {e}")))?
            .to_string();

        sqlx::query("INSERT INTO users (id, name, pass, mail) VALUES ($1, $2, $3, $4)")
            .bind(self.id)
            .bind(&self.name)
            .bind(&hash)
            .bind(&self.mail)
            .execute(pool)
            .await?;

        Ok(self)
    }
}

/// Create a test shirt, private by default.
pub fn test_shirt(owner_id: Uuid, team: &str, player: &str, season: &str) -> TestShirt {
    TestShirt {
        id: Uuid::now_v7(),
        owner_id,
        team: team.to_string(),
        player: player.to_string(),
        season: season.to_string(),
        photo_uri: "local://shirts/test/fixture.png".to_string(),
        estimated_value: None,
        personal_notes: None,
        is_public: false,
    }
}

/// A test shirt builder.
#[derive(Debug, Clone)]
pub struct TestShirt {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub team: String,
    pub player: String,
    pub season: String,
    pub photo_uri: String,
    /// Decimal text, cast by PostgreSQL.
    pub estimated_value: Option<String>,
    pub personal_notes: Option<String>,
    pub is_public: bool,
}

impl TestShirt {
    /// Show in the public showcase.
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    /// Hide from the public showcase.
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Set the estimated value, e.g. `"120.50"`.
    pub fn with_value(mut self, value: &str) -> Self {
        self.estimated_value = Some(value.to_string());
        self
    }

    /// Set private notes.
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.personal_notes = Some(notes.to_string());
        self
    }

    /// Set the stored photo URI.
    pub fn with_photo(mut self, uri: &str) -> Self {
        self.photo_uri = uri.to_string();
        self
    }

    /// Insert the shirt.
    pub async fn insert(self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            INSERT INTO shirt (id, owner_id, team, player, season, photo_uri,
                               estimated_value, personal_notes, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, CAST($7 AS NUMERIC), $8, $9)
            "#,
        )
        .bind(self.id)
        .bind(self.owner_id)
        .bind(&self.team)
        .bind(&self.player)
        .bind(&self.season)
        .bind(&self.photo_uri)
        .bind(&self.estimated_value)
        .bind(&self.personal_notes)
        .bind(self.is_public)
        .execute(pool)
        .await?;

        Ok(self)
    }
}

/// Builder for `multipart/form-data` request bodies.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("kitbag-{}", Uuid::now_v7().simple()),
            body: Vec::new(),
        }
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// `Content-Type` header value for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Finish the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

/// Assertion helpers for responses.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}
