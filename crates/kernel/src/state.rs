//! Application state shared across all handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::file::{FileStorage, LocalFileStorage};
use crate::showcase::ShowcaseService;
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Theme engine for template rendering.
    theme: Arc<ThemeEngine>,

    /// Photo storage.
    storage: Arc<dyn FileStorage>,

    /// Public showcase queries.
    showcase: Arc<ShowcaseService>,

    /// Bundled CSS/JS directory.
    static_dir: PathBuf,

    /// Maximum accepted photo size in bytes.
    max_upload_bytes: usize,
}

impl AppState {
    /// Connect to PostgreSQL, apply migrations and load templates.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;
        info!("database ready");

        let theme = ThemeEngine::new(&config.templates_dir, &config.files_url)
            .context("failed to load templates")?;

        let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(&config.uploads_dir));

        Ok(Self::from_parts(
            db,
            theme,
            storage,
            config.static_dir.clone(),
            config.max_upload_bytes,
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        db: PgPool,
        theme: ThemeEngine,
        storage: Arc<dyn FileStorage>,
        static_dir: PathBuf,
        max_upload_bytes: usize,
    ) -> Self {
        let showcase = ShowcaseService::new(db.clone());

        Self {
            inner: Arc::new(AppStateInner {
                db,
                theme: Arc::new(theme),
                storage,
                showcase,
                static_dir,
                max_upload_bytes,
            }),
        }
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &Arc<ThemeEngine> {
        &self.inner.theme
    }

    /// Get the photo storage backend.
    pub fn storage(&self) -> &Arc<dyn FileStorage> {
        &self.inner.storage
    }

    /// Get the showcase service.
    pub fn showcase(&self) -> &Arc<ShowcaseService> {
        &self.inner.showcase
    }

    pub fn static_dir(&self) -> &Path {
        &self.inner.static_dir
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.inner.max_upload_bytes
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
