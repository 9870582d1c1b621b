//! Shirt detail page and owner-scoped create, edit and delete.
//!
//! Owner-scoped handlers load the shirt by id and owner together, so a
//! shirt belonging to someone else is indistinguishable from a missing one.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::file::{FileStorage, Photo};
use crate::form::{CSRF_FIELD, ShirtForm, ValidationErrors};
use crate::models::{Shirt, ShirtInput, User};
use crate::routes::helpers::{
    FlashLevel, check_csrf, csrf_token, current_user, parse_id, push_flash, render,
    require_login,
};
use crate::state::AppState;

const DASHBOARD_PATH: &str = "/dashboard";
const PHOTO_FIELD: &str = "photo";

/// Create the shirt router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shirt/{id}", get(detail))
        .route("/dashboard/add", get(add_form).post(add_submit))
        .route("/dashboard/edit/{id}", get(edit_form).post(edit_submit))
        .route(
            "/dashboard/delete/{id}",
            get(delete_confirm).post(delete_submit),
        )
}

/// GET /shirt/{id}
///
/// Public shirts are visible to everyone; private ones only to their owner.
async fn detail(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let user = current_user(&state, &session).await;
    let viewer = user.as_ref().map(|u| u.id);

    let shirt = Shirt::find_visible(state.db(), id, viewer)
        .await?
        .ok_or(AppError::NotFound)?;

    let owner_name = User::find_by_id(state.db(), shirt.owner_id)
        .await?
        .map(|owner| owner.name)
        .unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("is_owner", &shirt.is_owned_by(viewer));
    context.insert("shirt", &shirt);
    context.insert("owner_name", &owner_name);

    Ok(render(&state, &session, user.as_ref(), "shirt/detail.html", context)
        .await?
        .into_response())
}

/// Everything submitted with the multipart shirt form.
#[derive(Debug, Default)]
struct ShirtSubmission {
    form: ShirtForm,
    token: String,
    photo: Option<(String, Vec<u8>)>,
}

/// Read the multipart body. An empty file input counts as no photo.
async fn read_submission(mut multipart: Multipart) -> AppResult<ShirtSubmission> {
    let mut submission = ShirtSubmission::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read multipart form");
                return Err(AppError::BadRequest("Failed to read form data".to_string()));
            }
        };
        let name = field.name().unwrap_or("").to_string();

        if name == PHOTO_FIELD {
            let filename = field.file_name().unwrap_or("").to_string();
            let data = field.bytes().await.map_err(|e| {
                warn!(error = %e, "failed to read uploaded photo");
                AppError::BadRequest("Failed to read uploaded photo".to_string())
            })?;
            if !data.is_empty() {
                submission.photo = Some((filename, data.to_vec()));
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|_| AppError::BadRequest(format!("Failed to read field {name}")))?;
        if name == CSRF_FIELD {
            submission.token = value;
        } else {
            submission.form.set(&name, value);
        }
    }

    Ok(submission)
}

/// Validate the submission. The photo is mandatory when `photo_required`.
fn validate_submission(
    submission: ShirtSubmission,
    photo_required: bool,
    max_upload_bytes: usize,
) -> Result<(ShirtInput, Option<Photo>), (ShirtForm, ValidationErrors)> {
    let (input, mut errors) = match submission.form.validate() {
        Ok(input) => (Some(input), ValidationErrors::new()),
        Err(errors) => (None, errors),
    };

    let photo = match submission.photo {
        Some((filename, data)) => match Photo::validate(&filename, data, max_upload_bytes) {
            Ok(photo) => Some(photo),
            Err(e) => {
                warn!(filename = %filename, error = %e, "rejected photo upload");
                errors.add(PHOTO_FIELD, e.to_string());
                None
            }
        },
        None => {
            if photo_required {
                errors.add(PHOTO_FIELD, "This field is required.");
            }
            None
        }
    };

    match input {
        Some(input) if errors.is_empty() => Ok((input, photo)),
        _ => Err((submission.form, errors)),
    }
}

/// Store a validated photo and return its URI.
async fn store_photo(storage: &dyn FileStorage, photo: &Photo) -> AppResult<String> {
    let uri = storage.generate_uri(&photo.filename);
    storage.write(&uri, &photo.data).await?;
    Ok(uri)
}

/// Remove a photo that is no longer referenced. Failures are only logged.
async fn discard_photo(storage: &dyn FileStorage, uri: &str) {
    if let Err(e) = storage.delete(uri).await {
        warn!(uri = %uri, error = %e, "failed to remove photo");
    }
}

/// Render the add/edit form, optionally with errors and a status code.
async fn render_form(
    state: &AppState,
    session: &Session,
    user: &User,
    form: &ShirtForm,
    errors: &ValidationErrors,
    shirt: Option<&Shirt>,
    status: StatusCode,
) -> AppResult<Response> {
    let action = match shirt {
        Some(shirt) => format!("/dashboard/edit/{}", shirt.id),
        None => "/dashboard/add".to_string(),
    };

    let mut context = tera::Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("shirt", &shirt);
    context.insert("action", &action);
    context.insert("is_edit", &shirt.is_some());
    context.insert("csrf_token", &csrf_token(session).await?);

    let html = render(state, session, Some(user), "shirt/form.html", context).await?;
    Ok((status, html).into_response())
}

/// GET /dashboard/add
async fn add_form(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    render_form(
        &state,
        &session,
        &user,
        &ShirtForm::default(),
        &ValidationErrors::new(),
        None,
        StatusCode::OK,
    )
    .await
}

/// POST /dashboard/add
async fn add_submit(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let submission = read_submission(multipart).await?;
    check_csrf(&session, &submission.token).await?;

    let (input, photo) = match validate_submission(submission, true, state.max_upload_bytes()) {
        Ok(valid) => valid,
        Err((form, errors)) => {
            return render_form(
                &state,
                &session,
                &user,
                &form,
                &errors,
                None,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };
    let Some(photo) = photo else {
        return Err(AppError::BadRequest("A photo is required".to_string()));
    };

    let storage = state.storage().as_ref();
    let photo_uri = store_photo(storage, &photo).await?;

    let shirt = match Shirt::create(state.db(), user.id, &input, &photo_uri).await {
        Ok(shirt) => shirt,
        Err(e) => {
            discard_photo(storage, &photo_uri).await;
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, shirt_id = %shirt.id, "shirt created");
    push_flash(&session, FlashLevel::Success, format!("\"{shirt}\" was added to your collection.")).await;

    Ok(Redirect::to(DASHBOARD_PATH).into_response())
}

/// Load a shirt owned by `owner_id`, or 404.
async fn owned_shirt(state: &AppState, raw_id: &str, owner_id: Uuid) -> AppResult<Shirt> {
    let id = parse_id(raw_id)?;
    Shirt::find_owned(state.db(), id, owner_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// GET /dashboard/edit/{id}
async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let shirt = owned_shirt(&state, &id, user.id).await?;

    render_form(
        &state,
        &session,
        &user,
        &ShirtForm::from_shirt(&shirt),
        &ValidationErrors::new(),
        Some(&shirt),
        StatusCode::OK,
    )
    .await
}

/// POST /dashboard/edit/{id}
///
/// Full replacement of the editable fields; the photo is kept unless a new
/// one is uploaded.
async fn edit_submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let existing = owned_shirt(&state, &id, user.id).await?;

    let submission = read_submission(multipart).await?;
    check_csrf(&session, &submission.token).await?;

    let (input, photo) = match validate_submission(submission, false, state.max_upload_bytes()) {
        Ok(valid) => valid,
        Err((form, errors)) => {
            return render_form(
                &state,
                &session,
                &user,
                &form,
                &errors,
                Some(&existing),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    let storage = state.storage().as_ref();
    let new_photo = match &photo {
        Some(photo) => Some(store_photo(storage, photo).await?),
        None => None,
    };

    let updated = match Shirt::update(
        state.db(),
        existing.id,
        user.id,
        &input,
        new_photo.as_deref(),
    )
    .await
    {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(uri) = &new_photo {
                discard_photo(storage, uri).await;
            }
            return Err(e.into());
        }
    };

    let Some(shirt) = updated else {
        // Deleted between load and update.
        if let Some(uri) = &new_photo {
            discard_photo(storage, uri).await;
        }
        return Err(AppError::NotFound);
    };

    if new_photo.is_some() && existing.photo_uri != shirt.photo_uri {
        discard_photo(storage, &existing.photo_uri).await;
    }

    info!(user_id = %user.id, shirt_id = %shirt.id, "shirt updated");
    push_flash(&session, FlashLevel::Success, format!("\"{shirt}\" was updated.")).await;

    Ok(Redirect::to(DASHBOARD_PATH).into_response())
}

/// GET /dashboard/delete/{id}
async fn delete_confirm(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let shirt = owned_shirt(&state, &id, user.id).await?;

    let mut context = tera::Context::new();
    context.insert("shirt", &shirt);
    context.insert("csrf_token", &csrf_token(&session).await?);

    Ok(
        render(&state, &session, Some(&user), "shirt/confirm_delete.html", context)
            .await?
            .into_response(),
    )
}

/// Delete confirmation form.
#[derive(Debug, Deserialize)]
struct DeleteForm {
    #[serde(rename = "_token", default)]
    token: String,
}

/// POST /dashboard/delete/{id}
async fn delete_submit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> AppResult<Response> {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let shirt = owned_shirt(&state, &id, user.id).await?;
    check_csrf(&session, &form.token).await?;

    if !Shirt::delete(state.db(), shirt.id, user.id).await? {
        return Err(AppError::NotFound);
    }
    discard_photo(state.storage().as_ref(), &shirt.photo_uri).await;

    info!(user_id = %user.id, shirt_id = %shirt.id, "shirt deleted");
    push_flash(&session, FlashLevel::Success, format!("\"{shirt}\" was deleted.")).await;

    Ok(Redirect::to(DASHBOARD_PATH).into_response())
}
