//! SQLite storage: pool setup, migrations, and per-entity query modules.

pub mod dpps;
pub mod projects;
pub mod sessions;
pub mod users;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::Result;

/// Open the pool and run pending migrations. The database file is
/// created on first start. In-memory databases are per-connection, so
/// those pools are capped at a single connection to keep every query
/// on the same database.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let max_connections = if url.contains(":memory:") { 1 } else { 5 };
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database ready ({url})");

    Ok(pool)
}
