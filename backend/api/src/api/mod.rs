//! HTTP surface: shared state, router assembly, and response plumbing.

pub mod auth;
pub mod dashboard;
pub mod dpp;
pub mod projects;
pub mod upload;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::SignatureVerifier;
use crate::clients::{ContentStore, LedgerAnchor};
use crate::config::Config;
use crate::db;
use crate::errors::{ApiError, FieldError, Result};
use crate::models::{Action, Project, Role, User};

/// Shared application state. Collaborators are trait objects so tests
/// and alternate deployments can swap implementations.
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub content_store: Arc<dyn ContentStore>,
    pub ledger: Arc<dyn LedgerAnchor>,
    /// `None` skips signature checks at login entirely.
    pub signature_verifier: Option<Arc<dyn SignatureVerifier>>,
}

/// Assemble the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .nest("/api/auth", auth::routes(state.clone()))
        .nest("/api/projects", projects::routes(state.clone()))
        .nest("/api/dpp", dpp::routes(state.clone()))
        .nest("/api/upload", upload::routes(state.clone()))
        .nest("/api/dashboard", dashboard::routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /`
async fn service_info() -> Response {
    success(
        StatusCode::OK,
        "Digital Product Passport API",
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/api/auth",
                "projects": "/api/projects",
                "dpp": "/api/dpp",
                "upload": "/api/upload",
                "dashboard": "/api/dashboard",
            },
        }),
    )
}

/// `GET /health`
async fn health(State(state): State<Arc<AppState>>) -> Response {
    success(
        StatusCode::OK,
        "DPP API is running",
        json!({
            "timestamp": Utc::now(),
            "environment": state.config.app_env,
        }),
    )
}

/// Uniform success envelope.
pub fn success(status: StatusCode, message: &str, data: Value) -> Response {
    (
        status,
        Json(json!({ "success": true, "message": message, "data": data })),
    )
        .into_response()
}

/// `Json` extractor that reports malformed bodies through the standard
/// validation envelope instead of axum's plain-text rejection.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
            })?;
        Ok(AppJson(value))
    }
}

/// Public QR verification link for an entity ID.
pub fn verification_url(base: &str, id: &str) -> String {
    format!("{}/verify/{}", base.trim_end_matches('/'), id)
}

// ─── authorization guards ───

/// Role permission gate for write operations.
pub fn ensure_permission(user: &User, action: Action) -> Result<()> {
    if user.role.permits(action) {
        return Ok(());
    }
    Err(ApiError::Forbidden(format!(
        "Your role '{}' does not have permission to {}",
        user.role.as_str(),
        action.describe()
    )))
}

/// Route-level role gate (dashboards).
pub fn ensure_role(user: &User, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    Err(ApiError::Forbidden(format!(
        "User role '{}' is not authorized to access this route",
        user.role.as_str()
    )))
}

/// Load a project or surface the standard 404.
pub async fn require_project(pool: &SqlitePool, project_id: &str) -> Result<Project> {
    db::projects::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".into()))
}

/// Project read access: the owner, any listed member acting in their
/// own role, or a regulator.
pub fn ensure_project_access(project: &Project, user: &User) -> Result<()> {
    if user.role == Role::Regulator || project.is_authorized(&user.wallet_address, user.role) {
        return Ok(());
    }
    Err(ApiError::Forbidden(
        "You are not authorized to access this project".into(),
    ))
}

/// Owner-only project mutations.
pub fn ensure_project_owner(project: &Project, user: &User) -> Result<()> {
    if project.owner_wallet_address == user.wallet_address {
        return Ok(());
    }
    Err(ApiError::Forbidden(
        "Only the project owner can perform this action".into(),
    ))
}

/// Pull one bucket out of a `GROUP BY status` result.
pub(crate) fn status_count(counts: &[(String, i64)], status: &str) -> i64 {
    counts
        .iter()
        .find(|(s, _)| s == status)
        .map(|(_, n)| *n)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_urls_strip_trailing_slashes() {
        assert_eq!(
            verification_url("http://localhost:5173/", "DPP-1"),
            "http://localhost:5173/verify/DPP-1"
        );
        assert_eq!(
            verification_url("https://dpp.example.com", "PRJ-1"),
            "https://dpp.example.com/verify/PRJ-1"
        );
    }
}
