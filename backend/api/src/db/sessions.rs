//! Session token queries. Session timestamps are unix seconds.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::Result;
use crate::models::User;

pub async fn create(
    pool: &SqlitePool,
    token: &str,
    wallet_address: &str,
    ttl_secs: i64,
) -> Result<()> {
    let now = Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO sessions (token, wallet_address, created_at, expires_at) \
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(token)
    .bind(wallet_address)
    .bind(now)
    .bind(now + ttl_secs)
    .execute(pool)
    .await?;
    Ok(())
}

/// Resolve a live token to its user. Expired or unknown tokens yield
/// `None`; expiry alone decides liveness here, the active flag is only
/// enforced when sessions are issued.
pub async fn resolve(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT u.wallet_address, u.role, u.name, u.company, u.email, u.phone_number, \
         u.profile_image, u.is_active, u.last_login, u.created_at, u.updated_at \
         FROM sessions s \
         JOIN users u ON u.wallet_address = s.wallet_address \
         WHERE s.token = ?1 AND s.expires_at > ?2",
    )
    .bind(token)
    .bind(Utc::now().timestamp())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn delete_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
        .bind(Utc::now().timestamp())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
