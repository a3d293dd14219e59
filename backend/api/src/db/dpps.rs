//! Passport queries.
//!
//! Phase sub-documents are JSON text columns; actor stamps inside them
//! are reachable with `json_extract`, which the dashboard queries lean
//! on. `insert`, `find_by_id`, and `update` take any executor so the
//! phase-write endpoints can run them inside a transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};

use crate::errors::{ApiError, Result};
use crate::models::{
    DigitalProductPassport, DppStatus, DppSummary, MaterialCategory, QuantityUnit,
    VerificationEvent,
};

const DPP_COLUMNS: &str = "dpp_id, project_id, product_name, category, quantity, unit, status, \
                           procurement_data, installation_data, enrichment_data, metadata, tags, \
                           document_completeness, compliance_status, verification_history, \
                           search_text, verification_url, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "dpp_id, project_id, product_name, category, status, created_at";

#[derive(sqlx::FromRow)]
struct DppRow {
    dpp_id: String,
    project_id: String,
    product_name: String,
    category: String,
    quantity: f64,
    unit: String,
    status: String,
    procurement_data: Option<String>,
    installation_data: Option<String>,
    enrichment_data: Option<String>,
    metadata: Option<String>,
    tags: String,
    document_completeness: i64,
    compliance_status: bool,
    verification_history: String,
    search_text: String,
    verification_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DppRow {
    fn into_dpp(self) -> Result<DigitalProductPassport> {
        Ok(DigitalProductPassport {
            category: MaterialCategory::parse(&self.category).ok_or_else(|| {
                ApiError::Internal(format!("unknown category '{}'", self.category))
            })?,
            unit: QuantityUnit::parse(&self.unit)
                .ok_or_else(|| ApiError::Internal(format!("unknown unit '{}'", self.unit)))?,
            status: DppStatus::parse(&self.status)
                .ok_or_else(|| ApiError::Internal(format!("unknown status '{}'", self.status)))?,
            procurement_data: self
                .procurement_data
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            installation_data: self
                .installation_data
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            enrichment_data: self
                .enrichment_data
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            metadata: self.metadata.as_deref().map(serde_json::from_str).transpose()?,
            tags: serde_json::from_str(&self.tags)?,
            verification_history: serde_json::from_str(&self.verification_history)?,
            dpp_id: self.dpp_id,
            project_id: self.project_id,
            product_name: self.product_name,
            quantity: self.quantity,
            document_completeness: self.document_completeness as u8,
            compliance_status: self.compliance_status,
            search_text: self.search_text,
            verification_url: self.verification_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub async fn insert(
    executor: impl SqliteExecutor<'_>,
    dpp: &DigitalProductPassport,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO dpps (dpp_id, project_id, product_name, category, quantity, unit, status, \
         procurement_data, installation_data, enrichment_data, metadata, tags, \
         document_completeness, compliance_status, verification_history, search_text, \
         verification_url, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19)",
    )
    .bind(&dpp.dpp_id)
    .bind(&dpp.project_id)
    .bind(&dpp.product_name)
    .bind(dpp.category.as_str())
    .bind(dpp.quantity)
    .bind(dpp.unit.as_str())
    .bind(dpp.status.as_str())
    .bind(dpp.procurement_data.as_ref().map(serde_json::to_string).transpose()?)
    .bind(dpp.installation_data.as_ref().map(serde_json::to_string).transpose()?)
    .bind(dpp.enrichment_data.as_ref().map(serde_json::to_string).transpose()?)
    .bind(dpp.metadata.as_ref().map(serde_json::to_string).transpose()?)
    .bind(serde_json::to_string(&dpp.tags)?)
    .bind(dpp.document_completeness as i64)
    .bind(dpp.compliance_status)
    .bind(serde_json::to_string(&dpp.verification_history)?)
    .bind(&dpp.search_text)
    .bind(&dpp.verification_url)
    .bind(dpp.created_at)
    .bind(dpp.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_by_id(
    executor: impl SqliteExecutor<'_>,
    dpp_id: &str,
) -> Result<Option<DigitalProductPassport>> {
    let row = sqlx::query_as::<_, DppRow>(&format!(
        "SELECT {DPP_COLUMNS} FROM dpps WHERE dpp_id = ?1"
    ))
    .bind(dpp_id)
    .fetch_optional(executor)
    .await?;
    row.map(DppRow::into_dpp).transpose()
}

/// Persist every phase-mutable field. The verification history is
/// deliberately excluded: it only grows through
/// [`append_verification`], so a phase write can never clobber a scan
/// recorded in between.
pub async fn update(
    executor: impl SqliteExecutor<'_>,
    dpp: &DigitalProductPassport,
) -> Result<()> {
    sqlx::query(
        "UPDATE dpps SET product_name = ?2, category = ?3, quantity = ?4, unit = ?5, \
         status = ?6, procurement_data = ?7, installation_data = ?8, enrichment_data = ?9, \
         metadata = ?10, tags = ?11, document_completeness = ?12, compliance_status = ?13, \
         search_text = ?14, updated_at = ?15 \
         WHERE dpp_id = ?1",
    )
    .bind(&dpp.dpp_id)
    .bind(&dpp.product_name)
    .bind(dpp.category.as_str())
    .bind(dpp.quantity)
    .bind(dpp.unit.as_str())
    .bind(dpp.status.as_str())
    .bind(dpp.procurement_data.as_ref().map(serde_json::to_string).transpose()?)
    .bind(dpp.installation_data.as_ref().map(serde_json::to_string).transpose()?)
    .bind(dpp.enrichment_data.as_ref().map(serde_json::to_string).transpose()?)
    .bind(dpp.metadata.as_ref().map(serde_json::to_string).transpose()?)
    .bind(serde_json::to_string(&dpp.tags)?)
    .bind(dpp.document_completeness as i64)
    .bind(dpp.compliance_status)
    .bind(&dpp.search_text)
    .bind(dpp.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Append one verification event in place. `json_insert` with the `#`
/// sentinel appends atomically, so concurrent scans all land.
pub async fn append_verification(
    pool: &SqlitePool,
    dpp_id: &str,
    event: &VerificationEvent,
) -> Result<()> {
    sqlx::query(
        "UPDATE dpps SET verification_history = \
         json_insert(verification_history, '$[#]', json(?2)), updated_at = ?3 \
         WHERE dpp_id = ?1",
    )
    .bind(dpp_id)
    .bind(serde_json::to_string(event)?)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

// ─── project listings ───

const PROJECT_LIST_WHERE: &str =
    "project_id = ?1 AND (?2 IS NULL OR status = ?2) AND (?3 IS NULL OR category = ?3)";

pub async fn list_for_project(
    pool: &SqlitePool,
    project_id: &str,
    status: Option<&str>,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<DigitalProductPassport>> {
    let rows = sqlx::query_as::<_, DppRow>(&format!(
        "SELECT {DPP_COLUMNS} FROM dpps WHERE {PROJECT_LIST_WHERE} \
         ORDER BY created_at DESC LIMIT ?4 OFFSET ?5"
    ))
    .bind(project_id)
    .bind(status)
    .bind(category)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(DppRow::into_dpp).collect()
}

pub async fn count_for_project_filtered(
    pool: &SqlitePool,
    project_id: &str,
    status: Option<&str>,
    category: Option<&str>,
) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM dpps WHERE {PROJECT_LIST_WHERE}"
    ))
    .bind(project_id)
    .bind(status)
    .bind(category)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

// ─── search ───

/// Scope subquery: projects the wallet owns or sits on any role list
/// of. A `None` wallet (regulator) searches unscoped.
const SEARCH_WHERE: &str = "(?1 IS NULL OR project_id IN ( \
        SELECT project_id FROM projects WHERE owner_wallet_address = ?1 \
        UNION \
        SELECT project_id FROM project_members WHERE wallet_address = ?1)) \
     AND (?2 IS NULL OR search_text LIKE '%' || ?2 || '%') \
     AND (?3 IS NULL OR category = ?3) \
     AND (?4 IS NULL OR status = ?4) \
     AND (?5 IS NULL OR project_id = ?5)";

#[allow(clippy::too_many_arguments)]
pub async fn search(
    pool: &SqlitePool,
    scope_wallet: Option<&str>,
    text: Option<&str>,
    category: Option<&str>,
    status: Option<&str>,
    project_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<DigitalProductPassport>> {
    let rows = sqlx::query_as::<_, DppRow>(&format!(
        "SELECT {DPP_COLUMNS} FROM dpps WHERE {SEARCH_WHERE} \
         ORDER BY created_at DESC LIMIT ?6 OFFSET ?7"
    ))
    .bind(scope_wallet)
    .bind(text)
    .bind(category)
    .bind(status)
    .bind(project_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(DppRow::into_dpp).collect()
}

pub async fn search_count(
    pool: &SqlitePool,
    scope_wallet: Option<&str>,
    text: Option<&str>,
    category: Option<&str>,
    status: Option<&str>,
    project_id: Option<&str>,
) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM dpps WHERE {SEARCH_WHERE}"
    ))
    .bind(scope_wallet)
    .bind(text)
    .bind(category)
    .bind(status)
    .bind(project_id)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

// ─── aggregations ───

pub async fn count_for_project(pool: &SqlitePool, project_id: &str) -> Result<i64> {
    let total =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dpps WHERE project_id = ?1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;
    Ok(total)
}

pub async fn status_counts_for_project(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<Vec<(String, i64)>> {
    let counts = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM dpps WHERE project_id = ?1 GROUP BY status",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(counts)
}

/// Category histogram, most frequent first.
pub async fn category_counts_for_project(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<Vec<(String, i64)>> {
    let counts = sqlx::query_as::<_, (String, i64)>(
        "SELECT category, COUNT(*) FROM dpps WHERE project_id = ?1 \
         GROUP BY category ORDER BY COUNT(*) DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(counts)
}

pub async fn average_completeness_for_project(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<f64> {
    let avg = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(document_completeness) FROM dpps WHERE project_id = ?1",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await?;
    Ok(avg.unwrap_or(0.0))
}

pub async fn compliant_count_for_project(pool: &SqlitePool, project_id: &str) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM dpps WHERE project_id = ?1 AND compliance_status = 1",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

pub async fn recent_for_project(
    pool: &SqlitePool,
    project_id: &str,
    limit: i64,
) -> Result<Vec<DppSummary>> {
    let recent = sqlx::query_as::<_, DppSummary>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM dpps WHERE project_id = ?1 \
         ORDER BY created_at DESC LIMIT ?2"
    ))
    .bind(project_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(recent)
}

// ─── per-actor views ───

/// Passports whose procurement was recorded by this wallet.
pub async fn created_by(
    pool: &SqlitePool,
    wallet_address: &str,
) -> Result<Vec<DigitalProductPassport>> {
    let rows = sqlx::query_as::<_, DppRow>(&format!(
        "SELECT {DPP_COLUMNS} FROM dpps \
         WHERE json_extract(procurement_data, '$.contractorWalletAddress') = ?1 \
         ORDER BY created_at DESC"
    ))
    .bind(wallet_address)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(DppRow::into_dpp).collect()
}

/// Passports whose installation was recorded by this wallet.
pub async fn installed_by(
    pool: &SqlitePool,
    wallet_address: &str,
) -> Result<Vec<DigitalProductPassport>> {
    let rows = sqlx::query_as::<_, DppRow>(&format!(
        "SELECT {DPP_COLUMNS} FROM dpps \
         WHERE json_extract(installation_data, '$.installerWalletAddress') = ?1 \
         ORDER BY json_extract(installation_data, '$.installationTimestamp') DESC"
    ))
    .bind(wallet_address)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(DppRow::into_dpp).collect()
}

/// Passports whose enrichment was recorded by this wallet.
pub async fn enriched_by(
    pool: &SqlitePool,
    wallet_address: &str,
) -> Result<Vec<DigitalProductPassport>> {
    let rows = sqlx::query_as::<_, DppRow>(&format!(
        "SELECT {DPP_COLUMNS} FROM dpps \
         WHERE json_extract(enrichment_data, '$.supplierWalletAddress') = ?1 \
         ORDER BY json_extract(enrichment_data, '$.enrichmentTimestamp') DESC"
    ))
    .bind(wallet_address)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(DppRow::into_dpp).collect()
}

/// Created-but-not-installed passports in projects where the wallet is
/// an authorized installer.
pub async fn pending_installations(
    pool: &SqlitePool,
    wallet_address: &str,
) -> Result<Vec<DppSummary>> {
    let pending = sqlx::query_as::<_, DppSummary>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM dpps \
         WHERE status = 'created' AND project_id IN ( \
             SELECT project_id FROM project_members \
             WHERE wallet_address = ?1 AND role = 'installer') \
         ORDER BY created_at DESC"
    ))
    .bind(wallet_address)
    .fetch_all(pool)
    .await?;
    Ok(pending)
}

/// Not-yet-enriched passports in projects where the wallet is an
/// authorized supplier.
pub async fn pending_enrichments(
    pool: &SqlitePool,
    wallet_address: &str,
) -> Result<Vec<DppSummary>> {
    let pending = sqlx::query_as::<_, DppSummary>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM dpps \
         WHERE status IN ('created', 'installed') AND project_id IN ( \
             SELECT project_id FROM project_members \
             WHERE wallet_address = ?1 AND role = 'supplier') \
         ORDER BY created_at DESC"
    ))
    .bind(wallet_address)
    .fetch_all(pool)
    .await?;
    Ok(pending)
}

// ─── regulator-wide aggregates ───

pub async fn count_all(pool: &SqlitePool) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dpps")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn status_counts_all(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let counts =
        sqlx::query_as::<_, (String, i64)>("SELECT status, COUNT(*) FROM dpps GROUP BY status")
            .fetch_all(pool)
            .await?;
    Ok(counts)
}

pub async fn compliant_count_all(pool: &SqlitePool) -> Result<i64> {
    let total =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dpps WHERE compliance_status = 1")
            .fetch_one(pool)
            .await?;
    Ok(total)
}
