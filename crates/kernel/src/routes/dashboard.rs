//! Collector dashboard and collection statistics.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_sessions::Session;

use crate::error::AppResult;
use crate::models::Shirt;
use crate::routes::helpers::{render, require_login};
use crate::state::AppState;
use crate::stats::CollectionStats;

/// Create the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/stats", get(stats))
}

/// GET /dashboard
///
/// Every shirt the caller owns, public and private, newest first.
async fn dashboard(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let shirts = Shirt::list_by_owner(state.db(), user.id).await?;

    let mut context = tera::Context::new();
    context.insert("shirts", &shirts);

    Ok(render(&state, &session, Some(&user), "dashboard.html", context)
        .await?
        .into_response())
}

/// GET /stats
async fn stats(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let stats = CollectionStats::for_owner(state.db(), user.id).await?;

    let mut context = tera::Context::new();
    context.insert("stats", &stats);

    Ok(render(&state, &session, Some(&user), "stats.html", context)
        .await?
        .into_response())
}
