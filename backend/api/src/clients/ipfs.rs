//! Pinata pinning client.
//!
//! Uploads retry with a linearly growing delay between attempts; the
//! gateway fetch path is a single attempt. An empty JWT disables
//! pinning, in which case uploads fail fast and the best-effort call
//! sites carry on without a CID.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};
use tracing::warn;

use super::ContentStore;
use crate::config::Config;
use crate::errors::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct PinataClient {
    client: Client,
    api_url: String,
    jwt: String,
    gateway: String,
    max_retries: u32,
    retry_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataClient {
    pub fn new(client: Client, config: &Config) -> Self {
        PinataClient {
            client,
            api_url: config.pinata_api_url.trim_end_matches('/').to_string(),
            jwt: config.pinata_jwt.clone(),
            gateway: config.pinata_gateway.trim_end_matches('/').to_string(),
            max_retries: config.ipfs_max_retries.max(1),
            retry_delay: Duration::from_millis(config.ipfs_retry_delay_ms),
        }
    }

    /// Pin with bounded retries. The delay grows linearly: one base
    /// delay after the first failure, two after the second, and so on.
    async fn pin_with_retry<F>(&self, build: F) -> Result<String>
    where
        F: Fn() -> Result<reqwest::RequestBuilder>,
    {
        if self.jwt.is_empty() {
            return Err(ApiError::External("IPFS pinning is not configured".into()));
        }

        let mut last_err = ApiError::External("IPFS pinning failed".into());
        for attempt in 1..=self.max_retries {
            match self.send_pin(build()?).await {
                Ok(cid) => return Ok(cid),
                Err(err) => {
                    warn!(
                        "IPFS pin attempt {attempt}/{} failed: {err}",
                        self.max_retries
                    );
                    last_err = err;
                    if attempt < self.max_retries {
                        sleep(self.retry_delay * attempt).await;
                    }
                }
            }
        }
        Err(last_err)
    }

    async fn send_pin(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .bearer_auth(&self.jwt)
            .send()
            .await
            .map_err(|e| ApiError::External(format!("IPFS request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ApiError::External(format!(
                "IPFS pin rejected with status {}",
                response.status()
            )));
        }
        let parsed: PinResponse = response
            .json()
            .await
            .map_err(|e| ApiError::External(format!("IPFS response was not valid JSON: {e}")))?;
        Ok(parsed.ipfs_hash)
    }
}

#[async_trait]
impl ContentStore for PinataClient {
    async fn put_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<String> {
        let url = format!("{}/pinning/pinFileToIPFS", self.api_url);
        self.pin_with_retry(|| {
            let part = Part::bytes(bytes.clone())
                .file_name(file_name.to_string())
                .mime_str(content_type)
                .map_err(|e| ApiError::External(format!("invalid content type: {e}")))?;
            Ok(self
                .client
                .post(&url)
                .multipart(Form::new().part("file", part)))
        })
        .await
    }

    async fn put_json(&self, value: &Value) -> Result<String> {
        let url = format!("{}/pinning/pinJSONToIPFS", self.api_url);
        let body = json!({ "pinataContent": value });
        self.pin_with_retry(|| Ok(self.client.post(&url).json(&body))).await
    }

    async fn get(&self, cid: &str) -> Result<(Vec<u8>, Option<String>)> {
        let response = self
            .client
            .get(self.url_for(cid))
            .send()
            .await
            .map_err(|e| ApiError::External(format!("IPFS gateway request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(ApiError::External(format!(
                "IPFS gateway returned status {}",
                response.status()
            )));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::External(format!("IPFS gateway read failed: {e}")))?;
        Ok((bytes.to_vec(), content_type))
    }

    fn url_for(&self, cid: &str) -> String {
        format!("{}/ipfs/{}", self.gateway, cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            port: 0,
            database_url: "sqlite::memory:".into(),
            app_env: "test".into(),
            frontend_url: "http://localhost:5173".into(),
            token_ttl_secs: 3600,
            pinata_api_url: "https://api.pinata.cloud/".into(),
            pinata_jwt: String::new(),
            pinata_gateway: "https://gateway.pinata.cloud/".into(),
            ipfs_max_retries: 3,
            ipfs_retry_delay_ms: 1,
            ledger_rpc_url: String::new(),
            signer_recovery_url: String::new(),
            max_upload_bytes: 1024,
            allowed_file_types: vec!["image/png".into()],
        }
    }

    #[test]
    fn pin_response_decodes_pinata_shape() {
        let raw = r#"{"IpfsHash":"QmTestHash","PinSize":123,"Timestamp":"2024-01-01T00:00:00Z"}"#;
        let parsed: PinResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.ipfs_hash, "QmTestHash");
    }

    #[test]
    fn gateway_urls_are_joined_without_double_slashes() {
        let client = PinataClient::new(Client::new(), &test_config());
        assert_eq!(
            client.url_for("QmTestHash"),
            "https://gateway.pinata.cloud/ipfs/QmTestHash"
        );
    }

    #[tokio::test]
    async fn puts_fail_fast_when_pinning_is_disabled() {
        let client = PinataClient::new(Client::new(), &test_config());
        let err = client.put_json(&json!({"a": 1})).await.unwrap_err();
        assert!(matches!(err, ApiError::External(_)));
    }
}
