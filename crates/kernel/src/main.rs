//! Kitbag server binary.

use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use clap::{Parser, Subcommand};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kitbag_kernel::form::RegisterForm;
use kitbag_kernel::models::User;
use kitbag_kernel::{AppState, Config, db, routes, session};

/// Room for the text fields and multipart framing around a photo.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Football shirt collection catalog.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve,

    /// Create an account without going through the registration form.
    CreateUser {
        /// Username.
        #[arg(long)]
        name: String,

        /// Email address.
        #[arg(long)]
        mail: String,

        /// Password.
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateUser {
            name,
            mail,
            password,
        } => create_user(config, name, mail, password).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!(port = config.port, "Starting Kitbag");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    let same_site = session::parse_same_site(&config.cookie_same_site);
    let session_layer =
        session::create_session_layer(&config.redis_url, same_site, config.cookie_secure)
            .await
            .context("failed to create session layer")?;

    info!("session store connected");

    let cors = build_cors_layer(&config.cors_allowed_origins);

    // Last added = first executed in request flow.
    let app = routes::router()
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes + FORM_OVERHEAD_BYTES,
        ))
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn create_user(config: Config, name: String, mail: String, password: String) -> Result<()> {
    let form = RegisterForm {
        username: name,
        email: mail,
        password1: password.clone(),
        password2: password,
        csrf_token: String::new(),
    };

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            for (field, messages) in errors.by_field() {
                for message in messages {
                    warn!(field = %field, "{message}");
                }
            }
            bail!("invalid account details");
        }
    };

    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    if User::name_exists(&pool, &input.name).await? {
        bail!("username {} is already taken", input.name);
    }

    let user = User::create(&pool, input).await?;
    info!(user_id = %user.id, name = %user.name, "user created");

    Ok(())
}

/// `*` alone allows any origin without credentials; otherwise only the
/// listed origins, with cookies.
fn build_cors_layer(allowed: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if matches!(allowed, [only] if only == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let mut origins = Vec::with_capacity(allowed.len());
    for origin in allowed {
        match HeaderValue::from_str(origin) {
            Ok(value) => origins.push(value),
            Err(_) => warn!(%origin, "skipping malformed CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kitbag=info,kitbag_kernel=info,tower_http=info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::Layer;

    #[test]
    fn cors_layers_accept_both_origin_modes() {
        let service = tower::service_fn(|_: axum::http::Request<axum::body::Body>| async {
            Ok::<_, std::convert::Infallible>(axum::http::Response::new(axum::body::Body::empty()))
        });

        // Layering validates the rules and panics on invalid combinations.
        let _ = build_cors_layer(&["*".to_string()]).layer(service.clone());
        let _ = build_cors_layer(&[
            "https://kitbag.example".to_string(),
            "bad\nvalue".to_string(),
        ])
        .layer(service);
    }
}
