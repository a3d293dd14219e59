use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use dpp_api::api::{self, AppState};
use dpp_api::auth::{self, HttpSignatureVerifier, SignatureVerifier};
use dpp_api::clients::{LedgerClient, PinataClient};
use dpp_api::config::Config;
use dpp_api::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let content_store = Arc::new(PinataClient::new(http.clone(), &config));
    let ledger = Arc::new(LedgerClient::new(http.clone(), config.ledger_rpc_url.clone()));
    let signature_verifier: Option<Arc<dyn SignatureVerifier>> =
        if config.signer_recovery_url.is_empty() {
            None
        } else {
            Some(Arc::new(HttpSignatureVerifier::new(
                http,
                config.signer_recovery_url.clone(),
            )))
        };

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState {
        pool: pool.clone(),
        config,
        content_store,
        ledger,
        signature_verifier,
    });

    tokio::spawn(auth::purge_expired_sessions(pool));

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
