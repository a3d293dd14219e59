//! Project queries.
//!
//! Locations, timelines, and budgets are JSON text columns; the
//! per-role authorization lists live in `project_members` and are
//! reassembled onto the model on every read.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::errors::{ApiError, Result};
use crate::models::{
    AuthorizedParty, Project, ProjectStatus, ProjectSummary, ProjectType, Role,
};

const PROJECT_COLUMNS: &str = "project_id, project_name, description, owner_wallet_address, \
                               project_type, status, location, total_floors, zones, timeline, \
                               budget, ipfs_hash, blockchain_tx_hash, verification_url, \
                               created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProjectRow {
    project_id: String,
    project_name: String,
    description: Option<String>,
    owner_wallet_address: String,
    project_type: String,
    status: String,
    location: Option<String>,
    total_floors: Option<i64>,
    zones: String,
    timeline: Option<String>,
    budget: Option<String>,
    ipfs_hash: Option<String>,
    blockchain_tx_hash: Option<String>,
    verification_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    role: String,
    wallet_address: String,
    added_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(self, members: Vec<MemberRow>) -> Result<Project> {
        let mut contractors = Vec::new();
        let mut installers = Vec::new();
        let mut suppliers = Vec::new();
        for member in members {
            let party = AuthorizedParty {
                wallet_address: member.wallet_address,
                added_at: member.added_at,
            };
            match member.role.as_str() {
                "contractor" => contractors.push(party),
                "installer" => installers.push(party),
                "supplier" => suppliers.push(party),
                other => {
                    return Err(ApiError::Internal(format!(
                        "unknown member role '{other}' on project {}",
                        self.project_id
                    )))
                }
            }
        }

        Ok(Project {
            project_type: ProjectType::parse(&self.project_type).ok_or_else(|| {
                ApiError::Internal(format!("unknown project type '{}'", self.project_type))
            })?,
            status: ProjectStatus::parse(&self.status).ok_or_else(|| {
                ApiError::Internal(format!("unknown project status '{}'", self.status))
            })?,
            location: self.location.as_deref().map(serde_json::from_str).transpose()?,
            zones: serde_json::from_str(&self.zones)?,
            timeline: self.timeline.as_deref().map(serde_json::from_str).transpose()?,
            budget: self.budget.as_deref().map(serde_json::from_str).transpose()?,
            project_id: self.project_id,
            project_name: self.project_name,
            description: self.description,
            owner_wallet_address: self.owner_wallet_address,
            total_floors: self.total_floors,
            authorized_contractors: contractors,
            authorized_installers: installers,
            authorized_suppliers: suppliers,
            ipfs_hash: self.ipfs_hash,
            blockchain_tx_hash: self.blockchain_tx_hash,
            verification_url: self.verification_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

async fn members_for(pool: &SqlitePool, project_id: &str) -> Result<Vec<MemberRow>> {
    let members = sqlx::query_as::<_, MemberRow>(
        "SELECT role, wallet_address, added_at FROM project_members \
         WHERE project_id = ?1 ORDER BY added_at",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(members)
}

pub async fn insert(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        "INSERT INTO projects (project_id, project_name, description, owner_wallet_address, \
         project_type, status, location, total_floors, zones, timeline, budget, ipfs_hash, \
         blockchain_tx_hash, verification_url, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )
    .bind(&project.project_id)
    .bind(&project.project_name)
    .bind(&project.description)
    .bind(&project.owner_wallet_address)
    .bind(project.project_type.as_str())
    .bind(project.status.as_str())
    .bind(project.location.as_ref().map(serde_json::to_string).transpose()?)
    .bind(project.total_floors)
    .bind(serde_json::to_string(&project.zones)?)
    .bind(project.timeline.as_ref().map(serde_json::to_string).transpose()?)
    .bind(project.budget.as_ref().map(serde_json::to_string).transpose()?)
    .bind(&project.ipfs_hash)
    .bind(&project.blockchain_tx_hash)
    .bind(&project.verification_url)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, project_id: &str) -> Result<Option<Project>> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"
    ))
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let members = members_for(pool, project_id).await?;
            Ok(Some(row.into_project(members)?))
        }
        None => Ok(None),
    }
}

/// Persist the fields the update endpoint may change.
pub async fn update(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        "UPDATE projects SET project_name = ?2, description = ?3, status = ?4, location = ?5, \
         timeline = ?6, budget = ?7, updated_at = ?8 WHERE project_id = ?1",
    )
    .bind(&project.project_id)
    .bind(&project.project_name)
    .bind(&project.description)
    .bind(project.status.as_str())
    .bind(project.location.as_ref().map(serde_json::to_string).transpose()?)
    .bind(project.timeline.as_ref().map(serde_json::to_string).transpose()?)
    .bind(project.budget.as_ref().map(serde_json::to_string).transpose()?)
    .bind(project.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Add a wallet to a project's role list. Returns `false` when the
/// wallet was already on it.
pub async fn add_member(
    pool: &SqlitePool,
    project_id: &str,
    role: Role,
    wallet_address: &str,
    added_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO project_members (project_id, role, wallet_address, added_at) \
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(project_id)
    .bind(role.as_str())
    .bind(wallet_address)
    .bind(added_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Visibility scope for project listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectFilter<'a> {
    /// Only projects owned by this wallet.
    pub owner: Option<&'a str>,
    /// Only projects where this wallet sits on the given role list.
    pub member: Option<(&'a str, Role)>,
    pub status: Option<&'a str>,
    pub project_type: Option<&'a str>,
}

impl ProjectFilter<'_> {
    fn member_wallet(&self) -> Option<&str> {
        self.member.map(|(wallet, _)| wallet)
    }

    fn member_role(&self) -> Option<&'static str> {
        self.member.map(|(_, role)| role.as_str())
    }
}

const LIST_WHERE: &str = "(?1 IS NULL OR owner_wallet_address = ?1) \
     AND (?2 IS NULL OR project_id IN (SELECT project_id FROM project_members \
          WHERE wallet_address = ?2 AND role = ?3)) \
     AND (?4 IS NULL OR status = ?4) \
     AND (?5 IS NULL OR project_type = ?5)";

pub async fn list(
    pool: &SqlitePool,
    filter: &ProjectFilter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE {LIST_WHERE} \
         ORDER BY created_at DESC LIMIT ?6 OFFSET ?7"
    ))
    .bind(filter.owner)
    .bind(filter.member_wallet())
    .bind(filter.member_role())
    .bind(filter.status)
    .bind(filter.project_type)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut projects = Vec::with_capacity(rows.len());
    for row in rows {
        let members = members_for(pool, &row.project_id).await?;
        projects.push(row.into_project(members)?);
    }
    Ok(projects)
}

pub async fn count(pool: &SqlitePool, filter: &ProjectFilter<'_>) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM projects WHERE {LIST_WHERE}"
    ))
    .bind(filter.owner)
    .bind(filter.member_wallet())
    .bind(filter.member_role())
    .bind(filter.status)
    .bind(filter.project_type)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Projects recorded on a user's worked-on set.
pub async fn assigned_summaries(
    pool: &SqlitePool,
    wallet_address: &str,
) -> Result<Vec<ProjectSummary>> {
    let summaries = sqlx::query_as::<_, ProjectSummary>(
        "SELECT p.project_id, p.project_name, p.status \
         FROM projects p \
         JOIN user_projects up ON up.project_id = p.project_id \
         WHERE up.wallet_address = ?1 \
         ORDER BY p.created_at DESC",
    )
    .bind(wallet_address)
    .fetch_all(pool)
    .await?;
    Ok(summaries)
}

/// Projects where the wallet sits on the given role list.
pub async fn member_summaries(
    pool: &SqlitePool,
    wallet_address: &str,
    role: Role,
) -> Result<Vec<ProjectSummary>> {
    let summaries = sqlx::query_as::<_, ProjectSummary>(
        "SELECT p.project_id, p.project_name, p.status \
         FROM projects p \
         JOIN project_members m ON m.project_id = p.project_id \
         WHERE m.wallet_address = ?1 AND m.role = ?2 \
         ORDER BY p.created_at DESC",
    )
    .bind(wallet_address)
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;
    Ok(summaries)
}
