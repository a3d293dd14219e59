//! User queries.

use sqlx::SqlitePool;

use crate::errors::Result;
use crate::models::{Role, User};

const USER_COLUMNS: &str = "wallet_address, role, name, company, email, phone_number, \
                            profile_image, is_active, last_login, created_at, updated_at";

pub async fn insert(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (wallet_address, role, name, company, email, phone_number, \
         profile_image, is_active, last_login, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&user.wallet_address)
    .bind(user.role)
    .bind(&user.name)
    .bind(&user.company)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(&user.profile_image)
    .bind(user.is_active)
    .bind(user.last_login)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_wallet(pool: &SqlitePool, wallet_address: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE wallet_address = ?1"
    ))
    .bind(wallet_address)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Lookup used when adding project members: the wallet must exist AND
/// hold the expected role.
pub async fn find_with_role(
    pool: &SqlitePool,
    wallet_address: &str,
    role: Role,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE wallet_address = ?1 AND role = ?2"
    ))
    .bind(wallet_address)
    .bind(role)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Persist the mutable profile fields plus login/active bookkeeping.
pub async fn update(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        "UPDATE users SET name = ?2, company = ?3, email = ?4, phone_number = ?5, \
         profile_image = ?6, is_active = ?7, last_login = ?8, updated_at = ?9 \
         WHERE wallet_address = ?1",
    )
    .bind(&user.wallet_address)
    .bind(&user.name)
    .bind(&user.company)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(&user.profile_image)
    .bind(user.is_active)
    .bind(user.last_login)
    .bind(user.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record that a user has worked on a project. Maintained as a set, so
/// repeat assignments are no-ops.
pub async fn assign_project(pool: &SqlitePool, wallet_address: &str, project_id: &str) -> Result<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO user_projects (wallet_address, project_id) VALUES (?1, ?2)",
    )
    .bind(wallet_address)
    .bind(project_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn assigned_project_ids(pool: &SqlitePool, wallet_address: &str) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT project_id FROM user_projects WHERE wallet_address = ?1 ORDER BY project_id",
    )
    .bind(wallet_address)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
