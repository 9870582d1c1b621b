#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for owner-scoped shirt management.

use axum::http::StatusCode;
use kitbag_kernel::file::FileStorage;
use kitbag_kernel::models::Shirt;
use kitbag_test_utils::{MultipartBody, PNG_BYTES, assert, test_shirt, unique_name};

mod common;
use common::{TestApp, location, response_text, run_test, shared_app};

fn shirt_body(token: &str, team: &str) -> MultipartBody {
    MultipartBody::new()
        .text("_token", token)
        .text("team", team)
        .text("player", "Del Piero")
        .text("season", "1996/97")
        .text("estimated_value", "120.5")
        .text("personal_notes", "Match worn")
        .text("is_public", "on")
}

async fn add_form(app: &TestApp, cookies: &str) -> (String, String) {
    app.csrf_from("/dashboard/add", cookies).await
}

#[test]
fn dashboard_requires_login() {
    run_test(async {
        let Some(app) = shared_app().await else { return };

        for path in ["/dashboard", "/dashboard/add", "/stats"] {
            let response = app.get(path, "").await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(location(&response).as_deref(), Some("/user/login"));
        }
    });
}

#[test]
fn add_shirt_stores_photo_and_record() {
    run_test(async {
        let Some(app) = shared_app().await else { return };
        let (user, cookies) = app.create_and_login_user("adder").await;
        let (cookies, token) = add_form(app, &cookies).await;
        let team = unique_name("Juventus");

        let body = shirt_body(&token, &team).file("photo", "front.png", "image/png", PNG_BYTES);
        let response = app.post_multipart("/dashboard/add", &cookies, body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response).as_deref(), Some("/dashboard"));

        let shirts = Shirt::list_by_owner(&app.db, user.id).await.unwrap();
        assert_eq!(shirts.len(), 1);
        let shirt = &shirts[0];
        assert_eq!(shirt.team, team);
        assert!(shirt.is_public);
        assert_eq!(shirt.estimated_value.unwrap().to_string(), "120.50");
        assert!(shirt.photo_uri.starts_with("local://shirts/"));
        assert!(app.state.storage().exists(&shirt.photo_uri).await.unwrap());

        let dashboard = response_text(app.get("/dashboard", &cookies).await).await;
        assert::contains(&dashboard, &team);
        assert::contains(&dashboard, "was added");
    });
}

#[test]
fn add_shirt_without_photo_is_rejected() {
    run_test(async {
        let Some(app) = shared_app().await else { return };
        let (user, cookies) = app.create_and_login_user("nophoto").await;
        let (cookies, token) = add_form(app, &cookies).await;

        let response = app
            .post_multipart("/dashboard/add", &cookies, shirt_body(&token, "Milan"))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = response_text(response).await;
        assert::contains(&html, "Milan");

        let shirts = Shirt::list_by_owner(&app.db, user.id).await.unwrap();
        assert!(shirts.is_empty());
    });
}

#[test]
fn add_shirt_rejects_non_image_upload() {
    run_test(async {
        let Some(app) = shared_app().await else { return };
        let (user, cookies) = app.create_and_login_user("textfile").await;
        let (cookies, token) = add_form(app, &cookies).await;

        let body = shirt_body(&token, "Napoli").file(
            "photo",
            "shirt.png",
            "image/png",
            b"definitely not a picture",
        );
        let response = app.post_multipart("/dashboard/add", &cookies, body).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(Shirt::list_by_owner(&app.db, user.id).await.unwrap().is_empty());
    });
}

#[test]
fn add_shirt_with_bad_token_is_rejected() {
    run_test(async {
        let Some(app) = shared_app().await else { return };
        let (user, cookies) = app.create_and_login_user("forger").await;
        let (cookies, _) = add_form(app, &cookies).await;

        let body = shirt_body("forged", "Torino").file("photo", "a.png", "image/png", PNG_BYTES);
        let response = app.post_multipart("/dashboard/add", &cookies, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(Shirt::list_by_owner(&app.db, user.id).await.unwrap().is_empty());
    });
}

#[test]
fn edit_keeps_photo_when_none_uploaded() {
    run_test(async {
        let Some(app) = shared_app().await else { return };
        let (user, cookies) = app.create_and_login_user("editor").await;
        let shirt = test_shirt(user.id, "Sampdoria", "Mancini", "1990/91")
            .insert(&app.db)
            .await
            .unwrap();

        let path = format!("/dashboard/edit/{}", shirt.id);
        let (cookies, token) = app.csrf_from(&path, &cookies).await;

        let body = MultipartBody::new()
            .text("_token", &token)
            .text("team", "Sampdoria")
            .text("player", "Vialli")
            .text("season", "1990/91");
        let response = app.post_multipart(&path, &cookies, body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let updated = Shirt::find_by_id(&app.db, shirt.id).await.unwrap().unwrap();
        assert_eq!(updated.player, "Vialli");
        assert_eq!(updated.photo_uri, shirt.photo_uri);
        assert!(!updated.is_public);
        assert!(updated.estimated_value.is_none());
    });
}

#[test]
fn other_collectors_cannot_touch_a_shirt() {
    run_test(async {
        let Some(app) = shared_app().await else { return };
        let owner = kitbag_test_utils::test_user("owner")
            .insert(&app.db)
            .await
            .unwrap();
        let shirt = test_shirt(owner.id, "Genoa", "Skuhravy", "1991/92")
            .public()
            .insert(&app.db)
            .await
            .unwrap();

        let (_, cookies) = app.create_and_login_user("intruder").await;
        let (cookies, token) = add_form(app, &cookies).await;

        let edit = format!("/dashboard/edit/{}", shirt.id);
        let delete = format!("/dashboard/delete/{}", shirt.id);

        assert_eq!(app.get(&edit, &cookies).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.get(&delete, &cookies).await.status(), StatusCode::NOT_FOUND);

        let body = MultipartBody::new()
            .text("_token", &token)
            .text("team", "Hijacked")
            .text("player", "Nobody")
            .text("season", "2000");
        assert_eq!(
            app.post_multipart(&edit, &cookies, body).await.status(),
            StatusCode::NOT_FOUND
        );

        let response = app
            .post_form(&delete, &cookies, &[("_token", &token)])
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let unchanged = Shirt::find_by_id(&app.db, shirt.id).await.unwrap().unwrap();
        assert_eq!(unchanged.team, "Genoa");

        // The public page stays readable, without owner controls.
        let html = response_text(app.get(&format!("/shirt/{}", shirt.id), &cookies).await).await;
        assert::not_contains(&html, &edit);
    });
}

#[test]
fn private_shirt_detail_is_shown_only_to_its_owner() {
    run_test(async {
        let Some(app) = shared_app().await else { return };
        let (owner, owner_cookies) = app.create_and_login_user("keeper").await;
        let (_, other_cookies) = app.create_and_login_user("visitor").await;

        let shirt = test_shirt(owner.id, "Sampdoria", "Vialli", "1990/91")
            .private()
            .with_value("1234.5")
            .with_notes("Scudetto season")
            .insert(&app.db)
            .await
            .unwrap();
        let path = format!("/shirt/{}", shirt.id);

        let response = app.get(&path, &owner_cookies).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = response_text(response).await;
        assert::contains(&html, "Private details");
        assert::contains(&html, "Scudetto season");
        assert::contains(&html, "1234.50 €");
        assert::contains(&html, &format!("/dashboard/edit/{}", shirt.id));

        let response = app.get(&path, &other_cookies).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = response_text(response).await;
        assert::not_contains(&html, "Scudetto season");
    });
}

#[test]
fn owner_can_delete_a_shirt() {
    run_test(async {
        let Some(app) = shared_app().await else { return };
        let (user, cookies) = app.create_and_login_user("deleter").await;
        let shirt = test_shirt(user.id, "Udinese", "Zico", "1983/84")
            .insert(&app.db)
            .await
            .unwrap();

        let path = format!("/dashboard/delete/{}", shirt.id);
        let (cookies, token) = app.csrf_from(&path, &cookies).await;

        let response = app.post_form(&path, &cookies, &[("_token", &token)]).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response).as_deref(), Some("/dashboard"));

        assert!(Shirt::find_by_id(&app.db, shirt.id).await.unwrap().is_none());
    });
}
