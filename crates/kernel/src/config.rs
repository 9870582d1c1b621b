//! Configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::file::DEFAULT_MAX_UPLOAD_BYTES;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PORT`, default 3000.
    pub port: u16,

    /// `DATABASE_URL`, required.
    pub database_url: String,

    /// `DATABASE_MAX_CONNECTIONS`, default 10.
    pub database_max_connections: u32,

    /// `REDIS_URL` of the session store.
    pub redis_url: String,

    /// `UPLOADS_DIR` where shirt photos are written.
    pub uploads_dir: PathBuf,

    /// `FILES_URL` that uploaded photos are served under.
    pub files_url: String,

    /// `TEMPLATES_DIR` holding the Tera templates.
    pub templates_dir: PathBuf,

    /// `STATIC_DIR` holding CSS and JavaScript.
    pub static_dir: PathBuf,

    /// `COOKIE_SAME_SITE`: strict, lax or none.
    pub cookie_same_site: String,

    /// `COOKIE_SECURE`, on unless explicitly disabled.
    pub cookie_secure: bool,

    /// `CORS_ALLOWED_ORIGINS`, comma separated, `*` for any.
    pub cors_allowed_origins: Vec<String>,

    /// `MAX_UPLOAD_BYTES` accepted for one photo.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let path = |key: &str, default: &str| PathBuf::from(text(key, default));

        Ok(Self {
            port: parsed(&lookup, "PORT", 3000)?,
            database_url: lookup("DATABASE_URL")
                .context("DATABASE_URL environment variable is required")?,
            database_max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: text("REDIS_URL", "redis://127.0.0.1:6379"),
            uploads_dir: path("UPLOADS_DIR", "./uploads"),
            files_url: text("FILES_URL", "/files"),
            templates_dir: path("TEMPLATES_DIR", "./templates"),
            static_dir: path("STATIC_DIR", "./static"),
            cookie_same_site: text("COOKIE_SAME_SITE", "lax").to_lowercase(),
            cookie_secure: lookup("COOKIE_SECURE").is_none_or(|v| parse_bool(&v)),
            cors_allowed_origins: text("CORS_ALLOWED_ORIGINS", "*")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            max_upload_bytes: parsed(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

/// Parse `key` when set, `default` otherwise.
fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
