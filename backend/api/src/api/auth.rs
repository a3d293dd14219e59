//! Authentication and profile endpoints.
//!
//! Identity is wallet-based. Registration and login issue opaque
//! bearer tokens; login optionally verifies a signed challenge when a
//! signature verifier is wired, and skips the check otherwise so
//! development setups work without a signer.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::{success, AppJson, AppState};
use crate::auth::{identity_matches, new_session_token, require_session, AuthUser};
use crate::db;
use crate::errors::{validation, ApiError, FieldError, Result};
use crate::models::{is_wallet_address, normalize_wallet, Role, User};

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/check-wallet", post(check_wallet))
        .route("/user/:wallet_address", get(get_user_by_wallet))
        .merge(protected)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    wallet_address: String,
    role: Role,
    name: String,
    company: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
}

impl RegisterRequest {
    fn validate(&self, wallet: &str) -> Result<()> {
        let mut errors = Vec::new();
        if !is_wallet_address(wallet) {
            errors.push(FieldError::new(
                "walletAddress",
                "Invalid wallet address format",
            ));
        }
        let name_len = self.name.trim().chars().count();
        if !(2..=100).contains(&name_len) {
            errors.push(FieldError::new(
                "name",
                "Name must be between 2 and 100 characters",
            ));
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
            if !email.contains('@') || !email.contains('.') {
                errors.push(FieldError::new("email", "Invalid email format"));
            }
        }
        if let Some(phone) = self.phone_number.as_deref().filter(|p| !p.is_empty()) {
            let valid = phone
                .chars()
                .all(|c| c.is_ascii_digit() || "+-() ".contains(c));
            if !valid {
                errors.push(FieldError::new("phoneNumber", "Invalid phone number format"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Subset of the user echoed by register and login.
fn user_projection(user: &User) -> serde_json::Value {
    json!({
        "walletAddress": user.wallet_address,
        "role": user.role,
        "name": user.name,
        "company": user.company,
        "email": user.email,
    })
}

/// `POST /api/auth/register`
async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<Response> {
    let wallet = normalize_wallet(&body.wallet_address);
    body.validate(&wallet)?;

    if db::users::find_by_wallet(&state.pool, &wallet).await?.is_some() {
        return Err(ApiError::Conflict(
            "User with this wallet address already exists".into(),
        ));
    }

    let now = Utc::now();
    let user = User {
        wallet_address: wallet.clone(),
        role: body.role,
        name: body.name.trim().to_string(),
        company: body.company,
        email: body.email,
        phone_number: body.phone_number,
        profile_image: None,
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    };
    db::users::insert(&state.pool, &user).await?;

    let token = new_session_token();
    db::sessions::create(&state.pool, &token, &wallet, state.config.token_ttl_secs).await?;

    Ok(success(
        StatusCode::CREATED,
        "User registered successfully",
        json!({ "user": user_projection(&user), "token": token }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    wallet_address: Option<String>,
    message: Option<String>,
    signature: Option<String>,
}

/// `POST /api/auth/login`
async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Response> {
    let wallet = body
        .wallet_address
        .as_deref()
        .map(normalize_wallet)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| validation("walletAddress", "Wallet address is required"))?;

    let mut user = db::users::find_by_wallet(&state.pool, &wallet)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found. Please register first.".into()))?;

    if !user.is_active {
        return Err(ApiError::Unauthenticated(
            "Your account has been deactivated".into(),
        ));
    }

    // Optional challenge: when the client sends a signed message and a
    // verifier is configured, the recovered signer must match the
    // claimed wallet.
    if let (Some(message), Some(signature)) = (&body.message, &body.signature) {
        if let Some(verifier) = &state.signature_verifier {
            let recovered = verifier.recover(message, signature).await.map_err(|err| {
                tracing::warn!("signature recovery failed: {err}");
                ApiError::Unauthenticated("Signature verification failed".into())
            })?;
            if !identity_matches(&wallet, &recovered) {
                return Err(ApiError::Unauthenticated("Invalid signature".into()));
            }
        }
    }

    let now = Utc::now();
    user.last_login = Some(now);
    user.updated_at = now;
    db::users::update(&state.pool, &user).await?;

    let token = new_session_token();
    db::sessions::create(&state.pool, &token, &wallet, state.config.token_ttl_secs).await?;

    let mut projection = user_projection(&user);
    projection["lastLogin"] = json!(user.last_login);
    Ok(success(
        StatusCode::OK,
        "Login successful",
        json!({ "user": projection, "token": token }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckWalletRequest {
    wallet_address: String,
}

/// `POST /api/auth/check-wallet`
async fn check_wallet(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<CheckWalletRequest>,
) -> Result<Response> {
    let wallet = normalize_wallet(&body.wallet_address);
    if !is_wallet_address(&wallet) {
        return Err(validation("walletAddress", "Invalid wallet address format"));
    }

    let data = match db::users::find_by_wallet(&state.pool, &wallet).await? {
        Some(user) => json!({
            "exists": true,
            "user": {
                "walletAddress": user.wallet_address,
                "role": user.role,
                "name": user.name,
            },
        }),
        None => json!({ "exists": false, "user": null }),
    };
    Ok(success(StatusCode::OK, "Wallet check completed", data))
}

/// `GET /api/auth/profile`
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Response> {
    let assigned = db::projects::assigned_summaries(&state.pool, &user.wallet_address).await?;
    let mut data = serde_json::to_value(&user)?;
    data["assignedProjects"] = json!(assigned);
    Ok(success(
        StatusCode::OK,
        "Profile retrieved successfully",
        json!({ "user": data }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    name: Option<String>,
    company: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    profile_image: Option<String>,
}

/// `PUT /api/auth/profile`
///
/// Partial update; empty strings are treated as absent, so fields can
/// be changed but not cleared.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(mut user)): Extension<AuthUser>,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> Result<Response> {
    if let Some(name) = non_empty(body.name) {
        user.name = name.trim().to_string();
    }
    if let Some(company) = non_empty(body.company) {
        user.company = Some(company);
    }
    if let Some(email) = non_empty(body.email) {
        user.email = Some(email);
    }
    if let Some(phone) = non_empty(body.phone_number) {
        user.phone_number = Some(phone);
    }
    if let Some(image) = non_empty(body.profile_image) {
        user.profile_image = Some(image);
    }
    user.updated_at = Utc::now();
    db::users::update(&state.pool, &user).await?;

    Ok(success(
        StatusCode::OK,
        "Profile updated successfully",
        json!({ "user": user }),
    ))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// `GET /api/auth/user/:walletAddress`
async fn get_user_by_wallet(
    State(state): State<Arc<AppState>>,
    Path(wallet_address): Path<String>,
) -> Result<Response> {
    let wallet = normalize_wallet(&wallet_address);
    let user = db::users::find_by_wallet(&state.pool, &wallet)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let project_ids = db::users::assigned_project_ids(&state.pool, &wallet).await?;

    let mut data = serde_json::to_value(&user)?;
    data["assignedProjects"] = json!(project_ids);
    Ok(success(
        StatusCode::OK,
        "User retrieved successfully",
        json!({ "user": data }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> RegisterRequest {
        RegisterRequest {
            wallet_address: "0xabcdef1234567890abcdef1234567890abcdef12".into(),
            role: Role::Contractor,
            name: name.into(),
            company: None,
            email: None,
            phone_number: None,
        }
    }

    #[test]
    fn register_validation_accepts_a_minimal_request() {
        let req = request("Asha Verma");
        assert!(req.validate(&normalize_wallet(&req.wallet_address)).is_ok());
    }

    #[test]
    fn register_validation_rejects_bad_wallets_and_names() {
        let req = request("A");
        let err = req.validate("0xnothex").unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert!(fields.contains(&"walletAddress"));
                assert!(fields.contains(&"name"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_validation_checks_optional_contact_fields() {
        let mut req = request("Asha Verma");
        req.email = Some("not-an-email".into());
        req.phone_number = Some("call me".into());
        let err = req
            .validate(&normalize_wallet(&req.wallet_address))
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
