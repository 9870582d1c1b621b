//! HTTP route handlers.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod helpers;
pub mod shirt;
pub mod showcase;
pub mod static_files;

use axum::Router;

use crate::state::AppState;

/// Every application route, without middleware.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(showcase::router())
        .merge(shirt::router())
        .merge(dashboard::router())
        .merge(auth::router())
        .merge(health::router())
        .merge(static_files::router())
}
