//! Sessions and authentication.
//!
//! Login and registration issue opaque bearer tokens backed by the
//! `sessions` table. The [`require_session`] middleware resolves the
//! token and attaches the user to the request. Account deactivation is
//! checked at issuance only; already-issued sessions ride out their
//! TTL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use rand::RngCore;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;

use crate::api::AppState;
use crate::db;
use crate::errors::{ApiError, Result};
use crate::models::{normalize_wallet, User};

/// Authenticated user attached to the request by [`require_session`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// 32 random bytes, hex encoded.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Session gate for protected routes. Resolves the bearer token and
/// attaches the user as a request extension.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&request).ok_or_else(|| {
        ApiError::Unauthenticated(
            "Not authorized to access this route. Please provide a valid token.".into(),
        )
    })?;

    let user = db::sessions::resolve(&state.pool, token).await?.ok_or_else(|| {
        ApiError::Unauthenticated(
            "Not authorized to access this route. Token is invalid or expired.".into(),
        )
    })?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

/// Compare a claimed wallet identity against a recovered one without
/// leaking the mismatch position through timing. Both sides are
/// normalized first.
pub fn identity_matches(claimed: &str, recovered: &str) -> bool {
    let claimed = normalize_wallet(claimed);
    let recovered = normalize_wallet(recovered);
    claimed.as_bytes().ct_eq(recovered.as_bytes()).into()
}

/// Recovers the signing wallet address from a login challenge.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn recover(&self, message: &str, signature: &str) -> Result<String>;
}

/// Delegates recovery to an HTTP sidecar. The sidecar owns the curve
/// math; this service only compares the recovered address against the
/// claimed one.
#[derive(Debug, Clone)]
pub struct HttpSignatureVerifier {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RecoverResponse {
    address: String,
}

impl HttpSignatureVerifier {
    pub fn new(client: Client, url: String) -> Self {
        HttpSignatureVerifier { client, url }
    }
}

#[async_trait]
impl SignatureVerifier for HttpSignatureVerifier {
    async fn recover(&self, message: &str, signature: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "message": message, "signature": signature }))
            .send()
            .await
            .map_err(|e| ApiError::External(format!("signature recovery failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ApiError::External(format!(
                "signature recovery returned status {}",
                response.status()
            )));
        }
        let parsed: RecoverResponse = response
            .json()
            .await
            .map_err(|e| ApiError::External(format!("signature recovery response invalid: {e}")))?;
        Ok(parsed.address)
    }
}

/// Hourly sweep of expired session rows. Spawned at startup.
pub async fn purge_expired_sessions(pool: SqlitePool) {
    let mut tick = tokio::time::interval(Duration::from_secs(3600));
    loop {
        tick.tick().await;
        match db::sessions::delete_expired(&pool).await {
            Ok(purged) if purged > 0 => tracing::debug!("purged {purged} expired sessions"),
            Ok(_) => {}
            Err(err) => tracing::warn!("session purge failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn tokens_are_64_hex_chars_and_unique() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn bearer_tokens_are_extracted_from_the_header() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request), Some("abc123"));

        let missing = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&missing), None);

        let wrong_scheme = Request::builder()
            .header(AUTHORIZATION, "Basic abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&wrong_scheme), None);

        let empty = Request::builder()
            .header(AUTHORIZATION, "Bearer ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&empty), None);
    }

    #[test]
    fn identity_comparison_normalizes_case() {
        assert!(identity_matches(
            "0xABCDEF1234567890abcdef1234567890ABCDEF12",
            "0xabcdef1234567890abcdef1234567890abcdef12"
        ));
        assert!(!identity_matches("0xabc", "0xabcd"));
        assert!(!identity_matches(
            "0xabcdef1234567890abcdef1234567890abcdef12",
            "0xabcdef1234567890abcdef1234567890abcdef13"
        ));
    }
}
