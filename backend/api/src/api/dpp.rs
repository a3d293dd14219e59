//! Passport endpoints.
//!
//! Writes are phase-based: contractors create with procurement data,
//! installers record installation, suppliers enrich. Each phase write
//! pins a snapshot and anchors the event (both best-effort), then
//! overwrites the phase sub-document inside a transaction. Verify and
//! blockchain-proof are public; everything else requires a session.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::{ensure_permission, require_project, success, verification_url, AppJson, AppState};
use crate::auth::{require_session, AuthUser};
use crate::clients::best_effort;
use crate::db;
use crate::errors::{validation, ApiError, FieldError, Result};
use crate::models::{
    Action, DigitalProductPassport, DppMetadata, DppStatus, EnrichmentData, InstallationData,
    MaterialCategory, ProcurementData, QuantityUnit, Role, VerificationEvent,
};
use crate::pagination::{self, Pagination};
use crate::scoring;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/:dpp_id/verify", get(verify_dpp))
        .route("/:dpp_id/blockchain-proof", get(blockchain_proof));

    let protected = Router::new()
        .route("/create", post(create_dpp))
        .route("/project/:project_id", get(list_project_dpps))
        .route("/search", get(search_dpps))
        .route("/:dpp_id", get(get_dpp))
        .route("/:dpp_id/install", put(record_installation))
        .route("/:dpp_id/enrich", put(enrich_dpp))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    public.merge(protected)
}

// ─── create ───

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDppRequest {
    project_id: String,
    product_name: String,
    category: MaterialCategory,
    quantity: f64,
    unit: QuantityUnit,
    #[serde(default)]
    procurement_data: ProcurementData,
    metadata: Option<DppMetadata>,
    #[serde(default)]
    tags: Vec<String>,
}

impl CreateDppRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.project_id.trim().is_empty() {
            errors.push(FieldError::new("projectId", "Project ID is required"));
        }
        let name_len = self.product_name.trim().chars().count();
        if !(2..=200).contains(&name_len) {
            errors.push(FieldError::new(
                "productName",
                "Product name must be between 2 and 200 characters",
            ));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            errors.push(FieldError::new(
                "quantity",
                "Quantity must be a positive number",
            ));
        }
        let has_supplier = self
            .procurement_data
            .supplier_name
            .as_deref()
            .map(str::trim)
            .is_some_and(|s| !s.is_empty());
        if !has_supplier {
            errors.push(FieldError::new(
                "procurementData.supplierName",
                "Supplier name is required",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// `POST /api/dpp/create`
async fn create_dpp(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    AppJson(body): AppJson<CreateDppRequest>,
) -> Result<Response> {
    ensure_permission(&user, Action::CreatePassport)?;
    body.validate()?;

    let project = require_project(&state.pool, &body.project_id).await?;
    if !project.is_authorized(&user.wallet_address, user.role) {
        return Err(ApiError::Forbidden(
            "You are not authorized for this project".into(),
        ));
    }

    let now = Utc::now();
    let dpp_id = DigitalProductPassport::generate_id(&project.project_id);

    let mut procurement = body.procurement_data;
    procurement.contractor_wallet_address = Some(user.wallet_address.clone());
    procurement.procurement_timestamp = Some(now);

    let snapshot = json!({
        "dppId": dpp_id,
        "projectId": project.project_id,
        "productName": body.product_name,
        "category": body.category,
        "quantity": body.quantity,
        "unit": body.unit,
        "procurementData": &procurement,
        "createdAt": now,
    });
    let snapshot_cid = best_effort(
        "passport metadata pin",
        state.content_store.put_json(&snapshot),
    )
    .await;
    procurement.procurement_blockchain_tx_hash = best_effort(
        "passport mint",
        state
            .ledger
            .mint_passport(&dpp_id, &project.project_id, snapshot_cid.as_deref()),
    )
    .await;

    let mut dpp = DigitalProductPassport {
        dpp_id: dpp_id.clone(),
        project_id: project.project_id.clone(),
        product_name: body.product_name.trim().to_string(),
        category: body.category,
        quantity: body.quantity,
        unit: body.unit,
        status: DppStatus::Created,
        procurement_data: Some(procurement),
        installation_data: None,
        enrichment_data: None,
        metadata: body.metadata,
        tags: body.tags,
        document_completeness: 0,
        compliance_status: false,
        verification_history: vec![],
        search_text: String::new(),
        verification_url: verification_url(&state.config.frontend_url, &dpp_id),
        created_at: now,
        updated_at: now,
    };
    dpp.document_completeness = scoring::completeness_score(&dpp);
    dpp.refresh_search_text();

    db::dpps::insert(&state.pool, &dpp).await?;

    Ok(success(
        StatusCode::CREATED,
        "DPP created successfully",
        json!({ "dpp": &dpp, "verificationUrl": &dpp.verification_url }),
    ))
}

// ─── listings ───

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectDppsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    status: Option<String>,
    category: Option<String>,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<&'static str>> {
    raw.map(|s| {
        DppStatus::parse(s)
            .map(|status| status.as_str())
            .ok_or_else(|| validation("status", "Invalid status filter"))
    })
    .transpose()
}

fn parse_category_filter(raw: Option<&str>) -> Result<Option<&'static str>> {
    raw.map(|s| {
        MaterialCategory::parse(s)
            .map(|category| category.as_str())
            .ok_or_else(|| validation("category", "Invalid category filter"))
    })
    .transpose()
}

/// `GET /api/dpp/project/:projectId`
async fn list_project_dpps(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(project_id): Path<String>,
    Query(query): Query<ListProjectDppsQuery>,
) -> Result<Response> {
    let (page, limit) = pagination::resolve(query.page, query.limit, 20)?;
    let status = parse_status_filter(query.status.as_deref())?;
    let category = parse_category_filter(query.category.as_deref())?;

    let project = require_project(&state.pool, &project_id).await?;
    if user.role != Role::Regulator && !project.is_authorized(&user.wallet_address, user.role) {
        return Err(ApiError::Forbidden(
            "You are not authorized to view this project".into(),
        ));
    }

    let dpps = db::dpps::list_for_project(
        &state.pool,
        &project_id,
        status,
        category,
        limit,
        (page - 1) * limit,
    )
    .await?;
    let total =
        db::dpps::count_for_project_filtered(&state.pool, &project_id, status, category).await?;

    Ok(success(
        StatusCode::OK,
        "DPPs retrieved successfully",
        json!({
            "dpps": dpps,
            "pagination": Pagination::new(page, limit, total),
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    query: Option<String>,
    category: Option<String>,
    status: Option<String>,
    project_id: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// `GET /api/dpp/search`
///
/// Text search over the denormalized haystack. Results are scoped to
/// projects the caller owns or is listed on; regulators search
/// everything.
async fn search_dpps(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    let (page, limit) = pagination::resolve(query.page, query.limit, 20)?;
    let status = parse_status_filter(query.status.as_deref())?;
    let category = parse_category_filter(query.category.as_deref())?;

    let scope_wallet = (user.role != Role::Regulator).then_some(user.wallet_address.as_str());
    let text = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let project_id = query.project_id.as_deref();

    let dpps = db::dpps::search(
        &state.pool,
        scope_wallet,
        text,
        category,
        status,
        project_id,
        limit,
        (page - 1) * limit,
    )
    .await?;
    let total =
        db::dpps::search_count(&state.pool, scope_wallet, text, category, status, project_id)
            .await?;

    Ok(success(
        StatusCode::OK,
        "Search completed successfully",
        json!({
            "dpps": dpps,
            "pagination": Pagination::new(page, limit, total),
        }),
    ))
}

/// `GET /api/dpp/:dppId`
async fn get_dpp(
    State(state): State<Arc<AppState>>,
    Path(dpp_id): Path<String>,
) -> Result<Response> {
    let dpp = db::dpps::find_by_id(&state.pool, &dpp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("DPP not found".into()))?;
    Ok(success(
        StatusCode::OK,
        "DPP details retrieved successfully",
        json!({ "dpp": dpp }),
    ))
}

// ─── phase writes ───

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstallRequest {
    #[serde(default)]
    installation_data: InstallationData,
}

impl InstallRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let has_location = self
            .installation_data
            .installation_location
            .as_deref()
            .map(str::trim)
            .is_some_and(|s| !s.is_empty());
        if !has_location {
            errors.push(FieldError::new(
                "installationData.installationLocation",
                "Installation location is required",
            ));
        }
        let has_installer = self
            .installation_data
            .installer_name
            .as_deref()
            .map(str::trim)
            .is_some_and(|s| !s.is_empty());
        if !has_installer {
            errors.push(FieldError::new(
                "installationData.installerName",
                "Installer name is required",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// `PUT /api/dpp/:dppId/install`
///
/// Unconditional overwrite of the installation phase. The actor stamp
/// and timestamp come from the session; client-supplied values for
/// either are discarded.
async fn record_installation(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(dpp_id): Path<String>,
    AppJson(body): AppJson<InstallRequest>,
) -> Result<Response> {
    ensure_permission(&user, Action::RecordInstallation)?;
    body.validate()?;

    let dpp = db::dpps::find_by_id(&state.pool, &dpp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("DPP not found".into()))?;
    let project = db::projects::find_by_id(&state.pool, &dpp.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Associated project not found".into()))?;
    if !project.is_authorized(&user.wallet_address, user.role) {
        return Err(ApiError::Forbidden(
            "You are not authorized to update installation for this project".into(),
        ));
    }

    let now = Utc::now();
    let mut installation = body.installation_data;
    installation.installer_wallet_address = Some(user.wallet_address.clone());
    installation.installation_timestamp = Some(now);

    let snapshot = json!({
        "dppId": dpp.dpp_id,
        "installationData": &installation,
        "updatedAt": now,
    });
    let snapshot_cid = best_effort(
        "installation data pin",
        state.content_store.put_json(&snapshot),
    )
    .await;
    installation.installation_blockchain_tx_hash = best_effort(
        "installation anchor",
        state
            .ledger
            .anchor_installation(&dpp.dpp_id, snapshot_cid.as_deref()),
    )
    .await;

    // Re-read and write inside a transaction so racing phase writers
    // serialize; the verification history is untouched by this update.
    let mut tx = state.pool.begin().await?;
    let mut dpp = db::dpps::find_by_id(&mut *tx, &dpp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("DPP not found".into()))?;
    dpp.installation_data = Some(installation);
    dpp.status = DppStatus::Installed;
    dpp.document_completeness = scoring::completeness_score(&dpp);
    dpp.refresh_search_text();
    dpp.updated_at = now;
    db::dpps::update(&mut *tx, &dpp).await?;
    tx.commit().await?;

    Ok(success(
        StatusCode::OK,
        "Installation data updated successfully",
        json!({ "dpp": &dpp }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrichRequest {
    #[serde(default)]
    enrichment_data: EnrichmentData,
}

/// `PUT /api/dpp/:dppId/enrich`
///
/// Records the enrichment phase and flips the compliance flag; this is
/// the only operation that can set it.
async fn enrich_dpp(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(dpp_id): Path<String>,
    AppJson(body): AppJson<EnrichRequest>,
) -> Result<Response> {
    ensure_permission(&user, Action::EnrichPassport)?;

    let dpp = db::dpps::find_by_id(&state.pool, &dpp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("DPP not found".into()))?;
    let project = db::projects::find_by_id(&state.pool, &dpp.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Associated project not found".into()))?;
    if !project.is_authorized(&user.wallet_address, user.role) {
        return Err(ApiError::Forbidden(
            "You are not authorized to enrich DPP for this project".into(),
        ));
    }

    let now = Utc::now();
    let mut enrichment = body.enrichment_data;
    enrichment.supplier_wallet_address = Some(user.wallet_address.clone());
    enrichment.enrichment_timestamp = Some(now);

    let snapshot = json!({
        "dppId": dpp.dpp_id,
        "enrichmentData": &enrichment,
        "updatedAt": now,
    });
    let snapshot_cid = best_effort(
        "enrichment data pin",
        state.content_store.put_json(&snapshot),
    )
    .await;
    enrichment.enrichment_blockchain_tx_hash = best_effort(
        "enrichment anchor",
        state
            .ledger
            .anchor_enrichment(&dpp.dpp_id, snapshot_cid.as_deref()),
    )
    .await;

    let mut tx = state.pool.begin().await?;
    let mut dpp = db::dpps::find_by_id(&mut *tx, &dpp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("DPP not found".into()))?;
    dpp.enrichment_data = Some(enrichment);
    dpp.status = DppStatus::Enriched;
    dpp.compliance_status = true;
    dpp.document_completeness = scoring::completeness_score(&dpp);
    dpp.refresh_search_text();
    dpp.updated_at = now;
    db::dpps::update(&mut *tx, &dpp).await?;
    tx.commit().await?;

    Ok(success(
        StatusCode::OK,
        "DPP enriched successfully",
        json!({ "dpp": &dpp }),
    ))
}

// ─── public endpoints ───

/// `GET /api/dpp/:dppId/verify`
///
/// QR scan endpoint. Returns a redacted projection, never the raw
/// passport, and records the scan on the verification history.
async fn verify_dpp(
    State(state): State<Arc<AppState>>,
    Path(dpp_id): Path<String>,
) -> Result<Response> {
    let dpp = db::dpps::find_by_id(&state.pool, &dpp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("DPP not found or invalid QR code".into()))?;
    let project = db::projects::find_by_id(&state.pool, &dpp.project_id).await?;

    let event = VerificationEvent {
        verified_at: Utc::now(),
        verified_by: None,
        notes: Some("QR code scanned".into()),
    };
    db::dpps::append_verification(&state.pool, &dpp.dpp_id, &event).await?;

    Ok(success(
        StatusCode::OK,
        "DPP verified successfully",
        json!({
            "dppId": dpp.dpp_id,
            "productName": dpp.product_name,
            "category": dpp.category,
            "quantity": dpp.quantity,
            "unit": dpp.unit,
            "status": dpp.status,
            "documentCompleteness": dpp.document_completeness,
            "complianceStatus": dpp.compliance_status,
            "project": project.map(|p| json!({
                "projectName": p.project_name,
                "location": p.location,
                "status": p.status,
            })),
            "createdAt": dpp.created_at,
            "verified": true,
        }),
    ))
}

/// `GET /api/dpp/:dppId/blockchain-proof`
async fn blockchain_proof(
    State(state): State<Arc<AppState>>,
    Path(dpp_id): Path<String>,
) -> Result<Response> {
    let dpp = db::dpps::find_by_id(&state.pool, &dpp_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("DPP not found".into()))?;
    Ok(success(
        StatusCode::OK,
        "Blockchain proof retrieved successfully",
        json!({ "proof": dpp.blockchain_proof() }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateDppRequest {
        CreateDppRequest {
            project_id: "PRJ-1-TEST".into(),
            product_name: "Steel Beam".into(),
            category: MaterialCategory::Steel,
            quantity: 10.0,
            unit: QuantityUnit::Ton,
            procurement_data: ProcurementData {
                supplier_name: Some("Tata Steel".into()),
                ..Default::default()
            },
            metadata: None,
            tags: vec![],
        }
    }

    #[test]
    fn create_validation_requires_a_supplier_name() {
        let mut req = create_request();
        assert!(req.validate().is_ok());

        req.procurement_data.supplier_name = Some("  ".into());
        assert!(req.validate().is_err());

        req.procurement_data.supplier_name = None;
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_validation_rejects_negative_and_non_finite_quantities() {
        let mut req = create_request();
        req.quantity = -1.0;
        assert!(req.validate().is_err());
        req.quantity = f64::NAN;
        assert!(req.validate().is_err());
        req.quantity = 0.0;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn install_validation_requires_location_and_installer() {
        let empty = InstallRequest {
            installation_data: InstallationData::default(),
        };
        match empty.validate().unwrap_err() {
            ApiError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }

        let full = InstallRequest {
            installation_data: InstallationData {
                installation_location: Some("Basement B2".into()),
                installer_name: Some("R. Sharma".into()),
                ..Default::default()
            },
        };
        assert!(full.validate().is_ok());
    }
}
