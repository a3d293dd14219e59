//! Clients for the external collaborators: the IPFS pinning service
//! and the ledger anchoring service.
//!
//! Both sit behind traits so handlers and tests never name a concrete
//! vendor. Record writes treat them as best-effort: a failed pin or
//! anchor is logged and the write proceeds without the reference.

pub mod ipfs;
pub mod ledger;

pub use ipfs::PinataClient;
pub use ledger::LedgerClient;

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

/// Content-addressed document store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Pin raw file bytes under the given name; returns the CID.
    async fn put_file(&self, bytes: Vec<u8>, file_name: &str, content_type: &str)
        -> Result<String>;
    /// Pin a JSON document; returns the CID.
    async fn put_json(&self, value: &Value) -> Result<String>;
    /// Fetch pinned content; returns the bytes and the content type
    /// reported by the gateway.
    async fn get(&self, cid: &str) -> Result<(Vec<u8>, Option<String>)>;
    /// Public gateway URL for a CID.
    fn url_for(&self, cid: &str) -> String;
}

/// Append-only anchoring of lifecycle events on an external ledger.
/// Every call returns the transaction hash recorded by the service.
#[async_trait]
pub trait LedgerAnchor: Send + Sync {
    async fn anchor_project(&self, project_id: &str, metadata_cid: Option<&str>)
        -> Result<String>;
    async fn mint_passport(
        &self,
        dpp_id: &str,
        project_id: &str,
        metadata_cid: Option<&str>,
    ) -> Result<String>;
    async fn anchor_installation(&self, dpp_id: &str, data_cid: Option<&str>) -> Result<String>;
    async fn anchor_enrichment(&self, dpp_id: &str, data_cid: Option<&str>) -> Result<String>;
}

/// Run a collaborator call whose failure must not block the caller.
/// A failure is logged and flattened to `None`.
pub async fn best_effort<T>(what: &str, fut: impl Future<Output = Result<T>>) -> Option<T> {
    match fut.await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("{what} failed, continuing without it: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;

    #[tokio::test]
    async fn best_effort_flattens_errors_to_none() {
        let ok = best_effort("noop", async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(ok, Some(7));

        let err = best_effort("noop", async {
            Err::<u32, _>(ApiError::External("down".into()))
        })
        .await;
        assert_eq!(err, None);
    }
}
