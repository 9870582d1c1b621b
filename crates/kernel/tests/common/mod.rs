#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! The [`TestApp`] wraps the REAL kernel router and state. Sessions live in
//! an in-memory store so only PostgreSQL is needed; tests return early when
//! `DATABASE_URL` is not set.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use kitbag_kernel::file::{FileStorage, LocalFileStorage};
use kitbag_kernel::theme::ThemeEngine;
use kitbag_kernel::{AppState, db, routes};

/// Shared Tokio runtime that outlives all individual test runtimes.
///
/// The pool's connections are bound to the runtime that opened them, so
/// every test body runs here via [`run_test`].
pub static SHARED_RT: std::sync::LazyLock<tokio::runtime::Runtime> =
    std::sync::LazyLock::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Failed to build shared test runtime")
    });

static SHARED_APP: std::sync::OnceLock<Option<TestApp>> = std::sync::OnceLock::new();

/// Get the shared [`TestApp`], or `None` when no database is configured.
pub async fn shared_app() -> Option<&'static TestApp> {
    SHARED_APP
        .get_or_init(|| {
            let handle = SHARED_RT.handle().clone();
            std::thread::spawn(move || handle.block_on(TestApp::new()))
                .join()
                .expect("TestApp init thread panicked")
        })
        .as_ref()
}

/// Run an async test body on [`SHARED_RT`].
pub fn run_test<F: std::future::Future<Output = ()> + Send>(f: F) {
    SHARED_RT.block_on(f);
}

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub db: PgPool,
    pub state: AppState,
}

impl TestApp {
    async fn new() -> Option<Self> {
        dotenvy::dotenv().ok();

        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping database-backed tests");
            return None;
        };

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        db::run_migrations(&db)
            .await
            .expect("Failed to run migrations");

        // Tests run from crates/kernel/, templates live at the project root.
        let project_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..");
        let theme = ThemeEngine::new(&project_root.join("templates"), "/files")
            .expect("Failed to load templates");

        let uploads_dir = std::env::temp_dir().join(format!(
            "kitbag-test-uploads-{}",
            uuid::Uuid::now_v7().simple()
        ));
        let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(&uploads_dir));

        let state = AppState::from_parts(
            db.clone(),
            theme,
            storage,
            project_root.join("static"),
            kitbag_kernel::file::DEFAULT_MAX_UPLOAD_BYTES,
        );

        let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

        // Must match main.rs, minus CORS and tracing.
        let router = routes::router()
            .layer(session_layer)
            .with_state(state.clone());

        Some(Self { router, db, state })
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET a path, optionally with session cookies.
    pub async fn get(&self, path: &str, cookies: &str) -> Response {
        let mut builder = Request::get(path);
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// POST an urlencoded form with session cookies.
    pub async fn post_form(&self, path: &str, cookies: &str, fields: &[(&str, &str)]) -> Response {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut builder = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        self.request(builder.body(Body::from(body)).unwrap()).await
    }

    /// POST a multipart body with session cookies.
    pub async fn post_multipart(
        &self,
        path: &str,
        cookies: &str,
        body: kitbag_test_utils::MultipartBody,
    ) -> Response {
        let content_type = body.content_type();
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::COOKIE, cookies)
            .body(Body::from(body.finish()))
            .unwrap();
        self.request(request).await
    }

    /// Fetch a page that carries a CSRF token, returning cookies and token.
    pub async fn csrf_from(&self, path: &str, cookies: &str) -> (String, String) {
        let response = self.get(path, cookies).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path} failed");
        let fresh = extract_cookies(&response);
        let cookies = if fresh.is_empty() {
            cookies.to_string()
        } else {
            fresh
        };
        let html = response_text(response).await;
        let token = extract_csrf_token(&html).expect("page has no CSRF token");
        (cookies, token)
    }

    /// Log in through the login form and return the session cookies.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (cookies, token) = self.csrf_from("/user/login", "").await;

        let response = self
            .post_form(
                "/user/login",
                &cookies,
                &[
                    ("username", username),
                    ("password", password),
                    ("_token", &token),
                ],
            )
            .await;

        assert_eq!(
            response.status(),
            StatusCode::SEE_OTHER,
            "Login failed for user '{username}'"
        );

        let cycled = extract_cookies(&response);
        if cycled.is_empty() { cookies } else { cycled }
    }

    /// Insert a fresh user and log them in.
    pub async fn create_and_login_user(&self, prefix: &str) -> (kitbag_test_utils::TestUser, String) {
        let user = kitbag_test_utils::test_user(prefix)
            .insert(&self.db)
            .await
            .expect("Failed to create test user");
        let cookies = self.login(&user.name, &user.password).await;
        (user, cookies)
    }
}

/// Extract Set-Cookie headers from a response for use in subsequent requests.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Redirect target of a response.
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).to_string()
}

pub async fn response_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}

pub fn extract_csrf_token(html: &str) -> Option<String> {
    let pattern = r#"name="_token" value=""#;
    let start = html.find(pattern)? + pattern.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

/// Number of shirt cards on a rendered showcase page.
pub fn card_count(html: &str) -> usize {
    html.matches(r#"<article class="card">"#).count()
}

/// Percent-encode a form or query value.
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
