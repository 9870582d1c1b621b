//! CSRF token generation and verification.
//!
//! Tokens live in the session as `token:issued_at` strings. They are
//! single-use and expire after [`TOKEN_VALIDITY_SECS`].

use anyhow::{Result, bail};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tower_sessions::Session;

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "form_tokens";

/// Maximum number of tokens to store per session.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

/// Form field carrying the token.
pub const CSRF_FIELD: &str = "_token";

/// Generate a CSRF token and store it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let token = new_token(now);

    let mut tokens = stored_tokens(session).await;
    tokens.push(format!("{token}:{now}"));
    // Oldest entries go first.
    let excess = tokens.len().saturating_sub(MAX_TOKENS);
    tokens.drain(..excess);

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store CSRF token: {e}"))?;

    Ok(token)
}

/// Verify a CSRF token against the session, consuming it on success.
pub async fn verify_csrf_token(session: &Session, submitted: &str) -> Result<bool> {
    if submitted.is_empty() {
        bail!("empty CSRF token");
    }

    let tokens = stored_tokens(session).await;
    let now = chrono::Utc::now().timestamp();
    let Some(remaining) = consume_token(tokens, submitted, now) else {
        return Ok(false);
    };

    session
        .insert(CSRF_SESSION_KEY, remaining)
        .await
        .map_err(|e| anyhow::anyhow!("failed to update CSRF tokens: {e}"))?;

    Ok(true)
}

/// Outstanding `token:issued_at` entries. An unreadable entry list is
/// treated as empty.
async fn stored_tokens(session: &Session) -> Vec<String> {
    session
        .get::<Vec<String>>(CSRF_SESSION_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Hex-encoded SHA-256 of 32 random bytes and the issue time.
fn new_token(now: i64) -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(now.to_le_bytes());
    hex::encode(hasher.finalize())
}

fn parse_entry(entry: &str) -> Option<(&str, i64)> {
    let (token, issued) = entry.split_once(':')?;
    Some((token, issued.parse().ok()?))
}

/// Remove `submitted` from `tokens` if present and fresh, also dropping
/// every expired entry. `None` means the token was not accepted.
fn consume_token(tokens: Vec<String>, submitted: &str, now: i64) -> Option<Vec<String>> {
    let fresh = |issued: i64| now - issued <= TOKEN_VALIDITY_SECS;

    let found = tokens
        .iter()
        .filter_map(|entry| parse_entry(entry))
        .any(|(token, issued)| token == submitted && fresh(issued));
    if !found {
        return None;
    }

    Some(
        tokens
            .into_iter()
            .filter(|entry| {
                parse_entry(entry).is_some_and(|(token, issued)| token != submitted && fresh(issued))
            })
            .collect(),
    )
}
