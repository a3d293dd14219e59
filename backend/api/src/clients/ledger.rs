//! JSON-RPC client for the ledger anchoring service.
//!
//! The service wraps the actual chain; this client only submits the
//! lifecycle event and returns the transaction hash. Anchoring is a
//! single attempt: callers treat a miss as a gap in the proof trail,
//! not a failure of the record write.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::LedgerAnchor;
use crate::errors::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    rpc_url: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<AnchorResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct AnchorResult {
    #[serde(rename = "txHash")]
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl LedgerClient {
    pub fn new(client: Client, rpc_url: String) -> Self {
        LedgerClient { client, rpc_url }
    }

    fn build_request(method: &str, params: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<String> {
        if self.rpc_url.is_empty() {
            return Err(ApiError::External(
                "ledger anchoring is not configured".into(),
            ));
        }

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&Self::build_request(method, params))
            .send()
            .await
            .map_err(|e| ApiError::External(format!("ledger RPC request failed: {e}")))?;
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ApiError::External(format!("ledger RPC response invalid: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(ApiError::External(format!(
                "ledger RPC error {}: {}",
                err.code, err.message
            )));
        }
        parsed
            .result
            .map(|r| r.tx_hash)
            .ok_or_else(|| ApiError::External("ledger RPC response had no result".into()))
    }
}

#[async_trait]
impl LedgerAnchor for LedgerClient {
    async fn anchor_project(
        &self,
        project_id: &str,
        metadata_cid: Option<&str>,
    ) -> Result<String> {
        self.call(
            "dpp_anchorProject",
            json!({ "projectId": project_id, "metadataCid": metadata_cid }),
        )
        .await
    }

    async fn mint_passport(
        &self,
        dpp_id: &str,
        project_id: &str,
        metadata_cid: Option<&str>,
    ) -> Result<String> {
        self.call(
            "dpp_mintPassport",
            json!({
                "dppId": dpp_id,
                "projectId": project_id,
                "metadataCid": metadata_cid,
            }),
        )
        .await
    }

    async fn anchor_installation(&self, dpp_id: &str, data_cid: Option<&str>) -> Result<String> {
        self.call(
            "dpp_recordInstallation",
            json!({ "dppId": dpp_id, "dataCid": data_cid }),
        )
        .await
    }

    async fn anchor_enrichment(&self, dpp_id: &str, data_cid: Option<&str>) -> Result<String> {
        self.call(
            "dpp_recordEnrichment",
            json!({ "dppId": dpp_id, "dataCid": data_cid }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_carry_the_jsonrpc_envelope() {
        let req = LedgerClient::build_request("dpp_mintPassport", json!({ "dppId": "DPP-1" }));
        assert_eq!(req["jsonrpc"], "2.0");
        assert_eq!(req["method"], "dpp_mintPassport");
        assert_eq!(req["params"]["dppId"], "DPP-1");
    }

    #[test]
    fn response_with_result_decodes_tx_hash() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"result":{"txHash":"0xabc123"}}"#;
        let parsed: RpcResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.result.unwrap().tx_hash, "0xabc123");
        assert!(parsed.error.is_none());
    }

    #[test]
    fn response_with_error_decodes_code_and_message() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"reverted"}}"#;
        let parsed: RpcResponse = serde_json::from_str(raw).unwrap();
        let err = parsed.error.unwrap();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "reverted");
    }

    #[tokio::test]
    async fn calls_fail_fast_when_anchoring_is_disabled() {
        let client = LedgerClient::new(Client::new(), String::new());
        let err = client.anchor_project("PRJ-1", None).await.unwrap_err();
        assert!(matches!(err, ApiError::External(_)));
    }
}
