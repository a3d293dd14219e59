//! Role dashboards.
//!
//! Each endpoint aggregates the slice of the data a given role works
//! from: owners get per-project rollups, field roles get their own
//! output plus work queues, regulators get the portfolio view.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Router};
use serde_json::{json, Map, Value};

use super::{ensure_role, require_project, status_count, success, AppState};
use crate::auth::{require_session, AuthUser};
use crate::db;
use crate::errors::{ApiError, Result};
use crate::models::Role;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/owner/:project_id", get(owner_dashboard))
        .route("/contractor", get(contractor_dashboard))
        .route("/installer", get(installer_dashboard))
        .route("/supplier", get(supplier_dashboard))
        .route("/regulator", get(regulator_dashboard))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

fn counts_to_object(counts: &[(String, i64)]) -> Value {
    let mut map = Map::new();
    for (key, count) in counts {
        map.insert(key.clone(), json!(count));
    }
    Value::Object(map)
}

fn rounded_percent(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).round()
}

/// `GET /api/dashboard/owner/:projectId`
async fn owner_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<String>,
) -> Result<Response> {
    ensure_role(&user, &[Role::Owner])?;

    let project = require_project(&state.pool, &project_id).await?;
    if project.owner_wallet_address != user.wallet_address {
        return Err(ApiError::Forbidden(
            "Not authorized to access this dashboard".into(),
        ));
    }

    let total = db::dpps::count_for_project(&state.pool, &project_id).await?;
    let statuses = db::dpps::status_counts_for_project(&state.pool, &project_id).await?;
    let categories = db::dpps::category_counts_for_project(&state.pool, &project_id).await?;
    let avg_completeness =
        db::dpps::average_completeness_for_project(&state.pool, &project_id).await?;
    let compliant = db::dpps::compliant_count_for_project(&state.pool, &project_id).await?;
    let recent = db::dpps::recent_for_project(&state.pool, &project_id, 10).await?;

    Ok(success(
        StatusCode::OK,
        "Owner dashboard data retrieved successfully",
        json!({
            "project": {
                "projectId": project.project_id,
                "projectName": project.project_name,
                "status": project.status,
                "location": project.location,
            },
            "statistics": {
                "totalDPPs": total,
                "statusBreakdown": {
                    "created": status_count(&statuses, "created"),
                    "installed": status_count(&statuses, "installed"),
                    "enriched": status_count(&statuses, "enriched"),
                },
                "categoryBreakdown": counts_to_object(&categories),
                "averageCompleteness": avg_completeness.round(),
                "complianceRate": rounded_percent(compliant, total),
            },
            "team": {
                "contractors": project.authorized_contractors,
                "installers": project.authorized_installers,
                "suppliers": project.authorized_suppliers,
            },
            "recentDPPs": recent,
        }),
    ))
}

/// `GET /api/dashboard/contractor`
async fn contractor_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Response> {
    ensure_role(&user, &[Role::Contractor])?;

    let created = db::dpps::created_by(&state.pool, &user.wallet_address).await?;
    let projects =
        db::projects::member_summaries(&state.pool, &user.wallet_address, Role::Contractor)
            .await?;

    let mut per_project: HashMap<&str, i64> = HashMap::new();
    for dpp in &created {
        *per_project.entry(dpp.project_id.as_str()).or_insert(0) += 1;
    }
    let dpps_by_project: Map<String, Value> = per_project
        .into_iter()
        .map(|(id, count)| (id.to_string(), json!(count)))
        .collect();

    let recent: Vec<_> = created.iter().take(10).collect();

    Ok(success(
        StatusCode::OK,
        "Contractor dashboard data retrieved successfully",
        json!({
            "statistics": {
                "totalDPPsCreated": created.len(),
                "assignedProjects": projects.len(),
                "dppsByProject": dpps_by_project,
            },
            "assignedProjects": projects,
            "recentDPPs": recent,
        }),
    ))
}

/// `GET /api/dashboard/installer`
async fn installer_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Response> {
    ensure_role(&user, &[Role::Installer])?;

    let installed = db::dpps::installed_by(&state.pool, &user.wallet_address).await?;
    let pending = db::dpps::pending_installations(&state.pool, &user.wallet_address).await?;
    let projects =
        db::projects::member_summaries(&state.pool, &user.wallet_address, Role::Installer).await?;

    let recent: Vec<_> = installed.iter().take(10).collect();

    Ok(success(
        StatusCode::OK,
        "Installer dashboard data retrieved successfully",
        json!({
            "statistics": {
                "totalInstallations": installed.len(),
                "pendingInstallations": pending.len(),
                "assignedProjects": projects.len(),
            },
            "assignedProjects": projects,
            "pendingInstallations": pending,
            "recentInstallations": recent,
        }),
    ))
}

/// `GET /api/dashboard/supplier`
async fn supplier_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Response> {
    ensure_role(&user, &[Role::Supplier])?;

    let enriched = db::dpps::enriched_by(&state.pool, &user.wallet_address).await?;
    let pending = db::dpps::pending_enrichments(&state.pool, &user.wallet_address).await?;
    let projects =
        db::projects::member_summaries(&state.pool, &user.wallet_address, Role::Supplier).await?;

    let recent: Vec<_> = enriched.iter().take(10).collect();

    Ok(success(
        StatusCode::OK,
        "Supplier dashboard data retrieved successfully",
        json!({
            "statistics": {
                "totalEnriched": enriched.len(),
                "pendingEnrichments": pending.len(),
                "assignedProjects": projects.len(),
            },
            "assignedProjects": projects,
            "pendingEnrichments": pending,
            "recentEnrichments": recent,
        }),
    ))
}

/// `GET /api/dashboard/regulator`
async fn regulator_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Response> {
    ensure_role(&user, &[Role::Regulator])?;

    let total_projects = db::projects::count(&state.pool, &Default::default()).await?;
    let total_dpps = db::dpps::count_all(&state.pool).await?;
    let statuses = db::dpps::status_counts_all(&state.pool).await?;
    let compliant = db::dpps::compliant_count_all(&state.pool).await?;
    let recent_projects = db::projects::list(&state.pool, &Default::default(), 10, 0).await?;

    let recent: Vec<Value> = recent_projects
        .into_iter()
        .map(|p| {
            json!({
                "projectId": p.project_id,
                "projectName": p.project_name,
                "location": p.location,
                "status": p.status,
                "createdAt": p.created_at,
            })
        })
        .collect();

    Ok(success(
        StatusCode::OK,
        "Regulator dashboard data retrieved successfully",
        json!({
            "statistics": {
                "totalProjects": total_projects,
                "totalDPPs": total_dpps,
                "complianceRate": rounded_percent(compliant, total_dpps),
                "dppsByStatus": counts_to_object(&statuses),
            },
            "recentProjects": recent,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_round_and_handle_empty_sets() {
        assert_eq!(rounded_percent(0, 0), 0.0);
        assert_eq!(rounded_percent(1, 3), 33.0);
        assert_eq!(rounded_percent(2, 3), 67.0);
        assert_eq!(rounded_percent(3, 3), 100.0);
    }

    #[test]
    fn status_counts_become_a_json_object() {
        let counts = vec![("created".to_string(), 4), ("enriched".to_string(), 1)];
        let value = counts_to_object(&counts);
        assert_eq!(value["created"], 4);
        assert_eq!(value["enriched"], 1);
        assert!(value.get("installed").is_none());
    }
}
