//! Authentication routes (register, login, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::form::{RegisterForm, ValidationErrors};
use crate::models::User;
use crate::routes::helpers::{
    FlashLevel, LOGIN_PATH, check_csrf, csrf_token, current_user, push_flash, render,
    session_user_id,
};
use crate::session::SESSION_USER_ID;
use crate::state::AppState;

/// Where users land after logging in.
const AFTER_LOGIN_PATH: &str = "/dashboard";

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/login", get(login_form).post(login_submit))
        .route("/user/logout", get(logout))
        .route("/user/register", get(register_form).post(register_submit))
}

/// Form-based login request.
#[derive(Debug, Deserialize)]
pub struct LoginFormRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "_token", default)]
    pub csrf_token: String,
}

/// Render the login page, optionally with an error.
async fn render_login(
    state: &AppState,
    session: &Session,
    username: &str,
    error: Option<&str>,
    status: StatusCode,
) -> AppResult<Response> {
    let mut context = tera::Context::new();
    context.insert("csrf_token", &csrf_token(session).await?);
    context.insert("username", username);
    context.insert("error", &error);

    let html = render(state, session, None, "user/login.html", context).await?;
    Ok((status, html).into_response())
}

/// GET /user/login
async fn login_form(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    if session_user_id(&session).await.is_some() {
        return Ok(Redirect::to(AFTER_LOGIN_PATH).into_response());
    }
    render_login(&state, &session, "", None, StatusCode::OK).await
}

/// POST /user/login
async fn login_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginFormRequest>,
) -> AppResult<Response> {
    check_csrf(&session, &form.csrf_token).await?;

    let user = User::authenticate(state.db(), form.username.trim(), &form.password).await?;
    let Some(user) = user else {
        info!(username = %form.username, "failed login attempt");
        return render_login(
            &state,
            &session,
            &form.username,
            Some("Please enter a correct username and password. Note that both fields may be case-sensitive."),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    };

    // New session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| anyhow::anyhow!("failed to cycle session id: {e}"))?;
    session
        .insert(SESSION_USER_ID, user.id)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store user in session: {e}"))?;

    info!(user_id = %user.id, "user logged in");
    Ok(Redirect::to(AFTER_LOGIN_PATH).into_response())
}

/// GET /user/logout
async fn logout(session: Session) -> AppResult<Response> {
    let user_id = session_user_id(&session).await;

    session
        .flush()
        .await
        .map_err(|e| anyhow::anyhow!("failed to delete session: {e}"))?;

    if let Some(user_id) = user_id {
        info!(user_id = %user_id, "user logged out");
    }
    Ok(Redirect::to("/").into_response())
}

/// Render the registration page.
async fn render_register(
    state: &AppState,
    session: &Session,
    form: &RegisterForm,
    errors: &ValidationErrors,
    status: StatusCode,
) -> AppResult<Response> {
    let mut context = tera::Context::new();
    context.insert("csrf_token", &csrf_token(session).await?);
    context.insert("form", form);
    context.insert("errors", errors);

    let html = render(state, session, None, "user/register.html", context).await?;
    Ok((status, html).into_response())
}

/// GET /user/register
async fn register_form(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    if current_user(&state, &session).await.is_some() {
        push_flash(&session, FlashLevel::Info, "You are already logged in.").await;
        return Ok(Redirect::to(AFTER_LOGIN_PATH).into_response());
    }

    render_register(
        &state,
        &session,
        &RegisterForm::default(),
        &ValidationErrors::new(),
        StatusCode::OK,
    )
    .await
}

/// POST /user/register
async fn register_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if current_user(&state, &session).await.is_some() {
        push_flash(&session, FlashLevel::Info, "You are already logged in.").await;
        return Ok(Redirect::to(AFTER_LOGIN_PATH).into_response());
    }
    check_csrf(&session, &form.csrf_token).await?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render_register(
                &state,
                &session,
                &form,
                &errors,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    if User::name_exists(state.db(), &input.name).await? {
        let mut errors = ValidationErrors::new();
        errors.add("username", "A user with that username already exists.");
        return render_register(
            &state,
            &session,
            &form,
            &errors,
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    }

    let user = User::create(state.db(), input)
        .await
        .map_err(AppError::Internal)?;

    info!(user_id = %user.id, "user registered");
    push_flash(
        &session,
        FlashLevel::Success,
        format!("Account created for {}! You can now log in.", user.name),
    )
    .await;

    Ok(Redirect::to(LOGIN_PATH).into_response())
}
