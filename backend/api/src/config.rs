//! Configuration loaded from the environment.
//!
//! Every knob has a development default, so a bare `cargo run` starts a
//! working server against `./dpp.db`. The pinning service, ledger
//! anchor, and signature recovery service are opt-in: leaving their
//! URLs (or the Pinata JWT) empty disables them, and the API degrades
//! to storage-only operation.

use std::str::FromStr;

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP API listens on.
    pub port: u16,
    /// SQLite database, e.g. `sqlite:./dpp.db`.
    pub database_url: String,
    /// `development` enables error detail in 500 responses.
    pub app_env: String,
    /// Base URL embedded in QR verification links.
    pub frontend_url: String,
    /// Session token lifetime in seconds.
    pub token_ttl_secs: i64,
    /// Pinata pinning API, e.g. `https://api.pinata.cloud`.
    pub pinata_api_url: String,
    /// Pinata JWT; empty disables pinning.
    pub pinata_jwt: String,
    /// Public gateway used to build `ipfs://` fetch URLs.
    pub pinata_gateway: String,
    /// Upload attempts before giving up on the pinning service.
    pub ipfs_max_retries: u32,
    /// Base delay between retries; grows linearly per attempt.
    pub ipfs_retry_delay_ms: u64,
    /// JSON-RPC endpoint of the anchoring service; empty disables it.
    pub ledger_rpc_url: String,
    /// Signature recovery sidecar; empty skips signature checks.
    pub signer_recovery_url: String,
    /// Per-file upload cap in bytes.
    pub max_upload_bytes: usize,
    /// MIME types accepted by the upload endpoints.
    pub allowed_file_types: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let allowed_file_types = env_or(
            "ALLOWED_FILE_TYPES",
            "image/jpeg,image/png,image/jpg,application/pdf,application/msword,\
             application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        )
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

        Ok(Config {
            port: parse_env("PORT", 5000)?,
            database_url: env_or("DATABASE_URL", "sqlite:./dpp.db"),
            app_env: env_or("APP_ENV", "development"),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:5173"),
            token_ttl_secs: parse_env("TOKEN_TTL_SECS", 604_800)?,
            pinata_api_url: env_or("PINATA_API_URL", "https://api.pinata.cloud"),
            pinata_jwt: env_or("PINATA_JWT", ""),
            pinata_gateway: env_or("PINATA_GATEWAY", "https://gateway.pinata.cloud"),
            ipfs_max_retries: parse_env("IPFS_MAX_RETRIES", 3)?,
            ipfs_retry_delay_ms: parse_env("IPFS_RETRY_DELAY_MS", 2000)?,
            ledger_rpc_url: env_or("LEDGER_RPC_URL", ""),
            signer_recovery_url: env_or("SIGNER_RECOVERY_URL", ""),
            max_upload_bytes: parse_env("MAX_FILE_SIZE", 10_485_760)?,
            allowed_file_types,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ApiError::Config(format!("{key} must be a number"))),
        Err(_) => Ok(default),
    }
}
