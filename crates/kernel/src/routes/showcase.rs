//! Public showcase page.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_sessions::Session;

use crate::error::AppResult;
use crate::routes::helpers::{current_user, render};
use crate::showcase::ShowcaseQuery;
use crate::state::AppState;

/// Create the showcase router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(showcase))
}

/// GET / (`q`, `sort`, `owner`, `page`)
async fn showcase(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ShowcaseQuery>,
) -> AppResult<Response> {
    let user = current_user(&state, &session).await;
    let page = state.showcase().page(&query).await?;

    let mut context = tera::Context::new();
    context.insert("page", &page);

    Ok(render(&state, &session, user.as_ref(), "showcase.html", context)
        .await?
        .into_response())
}
