//! Shared route helpers for page rendering, identity and flash messages.

use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::form::{generate_csrf_token, verify_csrf_token};
use crate::models::User;
use crate::session::{SESSION_FLASH, SESSION_USER_ID};
use crate::state::AppState;

/// Site name shown in every page title.
pub const SITE_NAME: &str = "Kitbag";

/// Login page unauthenticated users are sent to.
pub const LOGIN_PATH: &str = "/user/login";

/// Flash message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// User id stored in the session, if any.
pub async fn session_user_id(session: &Session) -> Option<Uuid> {
    session.get(SESSION_USER_ID).await.ok().flatten()
}

/// The logged-in user, if the session holds a valid one.
pub async fn current_user(state: &AppState, session: &Session) -> Option<User> {
    let id = session_user_id(session).await?;
    match User::find_by_id(state.db(), id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, user_id = %id, "failed to load session user");
            None
        }
    }
}

/// Require an authenticated user, or redirect to login.
pub async fn require_login(state: &AppState, session: &Session) -> Result<User, Response> {
    match current_user(state, session).await {
        Some(user) => Ok(user),
        None => Err(Redirect::to(LOGIN_PATH).into_response()),
    }
}

/// Queue a flash message for the next rendered page.
pub async fn push_flash(session: &Session, level: FlashLevel, message: impl Into<String>) {
    let mut messages: Vec<Flash> = session.get(SESSION_FLASH).await.ok().flatten().unwrap_or_default();
    messages.push(Flash {
        level,
        message: message.into(),
    });
    if let Err(e) = session.insert(SESSION_FLASH, messages).await {
        tracing::warn!(error = %e, "failed to store flash message");
    }
}

/// Remove and return pending flash messages.
pub async fn take_flash(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(SESSION_FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Issue a CSRF token for a form.
pub async fn csrf_token(session: &Session) -> AppResult<String> {
    Ok(generate_csrf_token(session).await?)
}

/// Reject a submission whose CSRF token is missing, stale or reused.
pub async fn check_csrf(session: &Session, submitted: &str) -> AppResult<()> {
    match verify_csrf_token(session, submitted).await {
        Ok(true) => Ok(()),
        Ok(false) | Err(_) => Err(AppError::BadRequest(
            "Invalid form token. Please reload the page and try again.".to_string(),
        )),
    }
}

/// Add the site-wide variables every page expects.
///
/// Adds: `site_name`, `user_authenticated`, `current_user`, `messages`
pub async fn inject_site_context(
    session: &Session,
    user: Option<&User>,
    context: &mut tera::Context,
) {
    context.insert("site_name", SITE_NAME);
    context.insert("user_authenticated", &user.is_some());
    context.insert("current_user", &user);
    context.insert("messages", &take_flash(session).await);
}

/// Render a page template with the site context.
pub async fn render(
    state: &AppState,
    session: &Session,
    user: Option<&User>,
    template: &str,
    mut context: tera::Context,
) -> AppResult<Html<String>> {
    inject_site_context(session, user, &mut context).await;
    let html = state.theme().render(template, &context)?;
    Ok(Html(html))
}

/// Parse a path id, treating malformed ids like missing entries.
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
