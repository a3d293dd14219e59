//! Project endpoints.
//!
//! Projects are created by owners, listed according to the caller's
//! role, and mutated only by their owner. Creation pins a metadata
//! snapshot and anchors the project on the ledger, both best-effort.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::{
    ensure_permission, ensure_project_access, ensure_project_owner, require_project,
    status_count, success, verification_url, AppJson, AppState,
};
use crate::auth::{require_session, AuthUser};
use crate::clients::best_effort;
use crate::db::{self, projects::ProjectFilter};
use crate::errors::{validation, ApiError, FieldError, Result};
use crate::models::{
    is_wallet_address, normalize_wallet, Action, Budget, Location, Project, ProjectStatus,
    ProjectType, Role, Timeline, User,
};
use crate::pagination::{self, Pagination};

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create_project))
        .route("/", get(list_projects))
        .route("/:project_id", get(get_project).put(update_project))
        .route("/:project_id/add-contractor", post(add_contractor))
        .route("/:project_id/add-installer", post(add_installer))
        .route("/:project_id/add-supplier", post(add_supplier))
        .route("/:project_id/stats", get(project_stats))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectRequest {
    project_name: String,
    description: Option<String>,
    project_type: ProjectType,
    location: Option<Location>,
    total_floors: Option<i64>,
    #[serde(default)]
    zones: Vec<String>,
    timeline: Option<Timeline>,
    budget: Option<Budget>,
}

impl CreateProjectRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let name_len = self.project_name.trim().chars().count();
        if !(3..=200).contains(&name_len) {
            errors.push(FieldError::new(
                "projectName",
                "Project name must be between 3 and 200 characters",
            ));
        }
        if let Some(address) = self.location.as_ref().and_then(|l| l.address.as_deref()) {
            if address.chars().count() > 500 {
                errors.push(FieldError::new(
                    "location.address",
                    "Address must not exceed 500 characters",
                ));
            }
        }
        if let Some(floors) = self.total_floors {
            if floors < 0 {
                errors.push(FieldError::new(
                    "totalFloors",
                    "Total floors cannot be negative",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// `POST /api/projects/create`
async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    AppJson(body): AppJson<CreateProjectRequest>,
) -> Result<Response> {
    ensure_permission(&user, Action::CreateProject)?;
    body.validate()?;

    let now = Utc::now();
    let project_id = Project::generate_id();

    let snapshot = json!({
        "projectId": project_id,
        "projectName": body.project_name,
        "description": body.description,
        "projectType": body.project_type,
        "location": body.location,
        "owner": user.wallet_address,
        "timestamp": now,
    });
    let ipfs_hash = best_effort(
        "project metadata pin",
        state.content_store.put_json(&snapshot),
    )
    .await;
    let blockchain_tx_hash = best_effort(
        "project anchor",
        state.ledger.anchor_project(&project_id, ipfs_hash.as_deref()),
    )
    .await;

    let mut budget = body.budget.unwrap_or_default();
    if budget.currency.is_none() {
        budget.currency = Some("INR".to_string());
    }

    let project = Project {
        project_id: project_id.clone(),
        project_name: body.project_name.trim().to_string(),
        description: body.description,
        owner_wallet_address: user.wallet_address.clone(),
        project_type: body.project_type,
        status: ProjectStatus::Active,
        location: body.location,
        total_floors: body.total_floors,
        zones: body.zones,
        authorized_contractors: vec![],
        authorized_installers: vec![],
        authorized_suppliers: vec![],
        timeline: body.timeline,
        budget: Some(budget),
        ipfs_hash,
        blockchain_tx_hash,
        verification_url: verification_url(&state.config.frontend_url, &project_id),
        created_at: now,
        updated_at: now,
    };
    db::projects::insert(&state.pool, &project).await?;
    db::users::assign_project(&state.pool, &user.wallet_address, &project_id).await?;

    Ok(success(
        StatusCode::CREATED,
        "Project created successfully",
        json!({ "project": project }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    status: Option<String>,
    project_type: Option<String>,
}

/// `GET /api/projects`
///
/// Owners see their own projects, members see projects they are listed
/// on, regulators see everything.
async fn list_projects(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Response> {
    let (page, limit) = pagination::resolve(query.page, query.limit, 10)?;

    let status = query
        .status
        .as_deref()
        .map(|raw| {
            ProjectStatus::parse(raw).ok_or_else(|| validation("status", "Invalid project status"))
        })
        .transpose()?;
    let project_type = query
        .project_type
        .as_deref()
        .map(|raw| {
            ProjectType::parse(raw).ok_or_else(|| validation("projectType", "Invalid project type"))
        })
        .transpose()?;

    let filter = ProjectFilter {
        owner: (user.role == Role::Owner).then_some(user.wallet_address.as_str()),
        member: matches!(
            user.role,
            Role::Contractor | Role::Installer | Role::Supplier
        )
        .then_some((user.wallet_address.as_str(), user.role)),
        status: status.map(|s| s.as_str()),
        project_type: project_type.map(|t| t.as_str()),
    };

    let projects = db::projects::list(&state.pool, &filter, limit, (page - 1) * limit).await?;
    let total = db::projects::count(&state.pool, &filter).await?;

    Ok(success(
        StatusCode::OK,
        "Projects retrieved successfully",
        json!({
            "projects": projects,
            "pagination": Pagination::new(page, limit, total),
        }),
    ))
}

/// `GET /api/projects/:projectId`
async fn get_project(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<String>,
) -> Result<Response> {
    let project = require_project(&state.pool, &project_id).await?;
    ensure_project_access(&project, &user)?;

    let dpp_count = db::dpps::count_for_project(&state.pool, &project_id).await?;
    let mut data = serde_json::to_value(&project)?;
    data["dppCount"] = json!(dpp_count);

    Ok(success(
        StatusCode::OK,
        "Project details retrieved successfully",
        json!({ "project": data }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProjectRequest {
    project_name: Option<String>,
    description: Option<String>,
    status: Option<ProjectStatus>,
    location: Option<Location>,
    timeline: Option<Timeline>,
    budget: Option<Budget>,
}

/// `PUT /api/projects/:projectId`
///
/// Sub-objects merge field-wise so a patch never wipes fields it does
/// not mention.
async fn update_project(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<String>,
    AppJson(body): AppJson<UpdateProjectRequest>,
) -> Result<Response> {
    let mut project = require_project(&state.pool, &project_id).await?;
    ensure_project_owner(&project, &user)?;

    if let Some(name) = body.project_name.filter(|s| !s.trim().is_empty()) {
        project.project_name = name.trim().to_string();
    }
    if let Some(description) = body.description {
        project.description = Some(description);
    }
    if let Some(status) = body.status {
        project.status = status;
    }
    if let Some(patch) = body.location {
        project.location = Some(Location::merged(project.location.take(), patch));
    }
    if let Some(patch) = body.timeline {
        project.timeline = Some(Timeline::merged(project.timeline.take(), patch));
    }
    if let Some(patch) = body.budget {
        project.budget = Some(Budget::merged(project.budget.take(), patch));
    }
    project.updated_at = Utc::now();
    db::projects::update(&state.pool, &project).await?;

    Ok(success(
        StatusCode::OK,
        "Project updated successfully",
        json!({ "project": project }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMemberRequest {
    wallet_address: String,
}

/// `POST /api/projects/:projectId/add-contractor`
async fn add_contractor(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<String>,
    AppJson(body): AppJson<AddMemberRequest>,
) -> Result<Response> {
    add_member(&state, &user, &project_id, &body.wallet_address, Role::Contractor, "Contractor")
        .await
}

/// `POST /api/projects/:projectId/add-installer`
async fn add_installer(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<String>,
    AppJson(body): AppJson<AddMemberRequest>,
) -> Result<Response> {
    add_member(&state, &user, &project_id, &body.wallet_address, Role::Installer, "Installer")
        .await
}

/// `POST /api/projects/:projectId/add-supplier`
async fn add_supplier(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<String>,
    AppJson(body): AppJson<AddMemberRequest>,
) -> Result<Response> {
    add_member(&state, &user, &project_id, &body.wallet_address, Role::Supplier, "Supplier")
        .await
}

/// Shared add-member flow: the target wallet must be a registered user
/// holding exactly the role being granted.
async fn add_member(
    state: &AppState,
    user: &User,
    project_id: &str,
    wallet_address: &str,
    role: Role,
    label: &str,
) -> Result<Response> {
    let wallet = normalize_wallet(wallet_address);
    if !is_wallet_address(&wallet) {
        return Err(validation("walletAddress", "Invalid wallet address format"));
    }

    let project = require_project(&state.pool, project_id).await?;
    ensure_project_owner(&project, user)?;

    db::users::find_with_role(&state.pool, &wallet, role)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "{label} not found or user is not a {}",
                role.as_str()
            ))
        })?;

    let added = db::projects::add_member(&state.pool, project_id, role, &wallet, Utc::now()).await?;
    if !added {
        return Err(ApiError::Conflict(format!(
            "{label} already authorized for this project"
        )));
    }
    db::users::assign_project(&state.pool, &wallet, project_id).await?;

    let project = require_project(&state.pool, project_id).await?;
    Ok(success(
        StatusCode::OK,
        &format!("{label} added successfully"),
        json!({ "project": project }),
    ))
}

/// `GET /api/projects/:projectId/stats`
async fn project_stats(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<String>,
) -> Result<Response> {
    let project = require_project(&state.pool, &project_id).await?;
    ensure_project_access(&project, &user)?;

    let total = db::dpps::count_for_project(&state.pool, &project_id).await?;
    let status_counts = db::dpps::status_counts_for_project(&state.pool, &project_id).await?;
    let categories = db::dpps::category_counts_for_project(&state.pool, &project_id).await?;
    let average_completeness =
        db::dpps::average_completeness_for_project(&state.pool, &project_id).await?;

    let enriched = status_count(&status_counts, "enriched");
    let completion_rate = if total > 0 {
        ((enriched as f64 / total as f64) * 100.0).round() as i64
    } else {
        0
    };

    let category_breakdown: Vec<_> = categories
        .iter()
        .map(|(category, count)| json!({ "category": category, "count": count }))
        .collect();

    Ok(success(
        StatusCode::OK,
        "Project statistics retrieved successfully",
        json!({
            "projectInfo": {
                "projectId": project.project_id,
                "projectName": project.project_name,
                "status": project.status,
            },
            "dppStats": {
                "total": total,
                "created": status_count(&status_counts, "created"),
                "installed": status_count(&status_counts, "installed"),
                "enriched": enriched,
                "completionRate": completion_rate,
            },
            "categoryBreakdown": category_breakdown,
            "averageCompleteness": average_completeness,
            "teamSize": {
                "contractors": project.authorized_contractors.len(),
                "installers": project.authorized_installers.len(),
                "suppliers": project.authorized_suppliers.len(),
            },
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            project_name: name.into(),
            description: None,
            project_type: ProjectType::Residential,
            location: None,
            total_floors: None,
            zones: vec![],
            timeline: None,
            budget: None,
        }
    }

    #[test]
    fn project_names_must_be_three_to_two_hundred_chars() {
        assert!(request("Skyline Towers").validate().is_ok());
        assert!(request("ab").validate().is_err());
        assert!(request(&"x".repeat(201)).validate().is_err());
    }

    #[test]
    fn negative_floor_counts_are_rejected() {
        let mut req = request("Skyline Towers");
        req.total_floors = Some(-1);
        assert!(req.validate().is_err());
        req.total_floors = Some(0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn overlong_addresses_are_rejected() {
        let mut req = request("Skyline Towers");
        req.location = Some(Location {
            address: Some("a".repeat(501)),
            ..Default::default()
        });
        assert!(req.validate().is_err());
    }
}
