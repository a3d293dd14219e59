//! File upload endpoints.
//!
//! Multipart uploads are forwarded to the pinning service; unlike the
//! passport side effects these are NOT best-effort, a failed pin fails
//! the request. Retrieval by CID is public.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use super::{success, AppState};
use crate::auth::require_session;
use crate::errors::{validation, ApiError, Result};

const MAX_FILES_PER_REQUEST: usize = 10;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Body limit sized for a full batch, with multipart overhead.
    let body_limit = state.config.max_upload_bytes * (MAX_FILES_PER_REQUEST + 2);

    let public = Router::new()
        .route("/ipfs/:cid", get(retrieve_file))
        .route("/ipfs-url/:cid", get(ipfs_url));

    let protected = Router::new()
        .route("/ipfs", post(upload_single))
        .route("/ipfs-multiple", post(upload_multiple))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    public.merge(protected).layer(DefaultBodyLimit::max(body_limit))
}

struct UploadedPart {
    bytes: Vec<u8>,
    file_name: String,
    content_type: String,
}

/// Pulls the next part out of the multipart stream, checking size and
/// MIME type against the configured limits.
async fn read_part(
    state: &AppState,
    field: axum::extract::multipart::Field<'_>,
) -> Result<UploadedPart> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|err| validation("file", err.body_text()))?;

    if bytes.len() > state.config.max_upload_bytes {
        return Err(validation(
            "file",
            "File size exceeds maximum allowed size",
        ));
    }
    if !state
        .config
        .allowed_file_types
        .iter()
        .any(|allowed| allowed == &content_type)
    {
        return Err(validation(
            "file",
            format!("Invalid file type: {content_type}"),
        ));
    }

    Ok(UploadedPart {
        bytes: bytes.to_vec(),
        file_name,
        content_type,
    })
}

/// `POST /api/upload/ipfs`
async fn upload_single(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut uploaded = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| validation("file", err.body_text()))?
    {
        if field.name() == Some("file") {
            uploaded = Some(read_part(&state, field).await?);
            break;
        }
    }
    let part = uploaded.ok_or_else(|| validation("file", "No file uploaded"))?;

    let size = part.bytes.len();
    let cid = state
        .content_store
        .put_file(part.bytes, &part.file_name, &part.content_type)
        .await?;

    Ok(success(
        StatusCode::OK,
        "File uploaded successfully",
        json!({
            "ipfsHash": cid,
            "ipfsUrl": state.content_store.url_for(&cid),
            "fileName": part.file_name,
            "fileSize": size,
            "mimeType": part.content_type,
        }),
    ))
}

/// `POST /api/upload/ipfs-multiple`
///
/// Parts named `files` are pinned in order; the whole request fails on
/// the first bad part so callers never get a partial-success response
/// they cannot distinguish from a full one.
async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| validation("files", err.body_text()))?
    {
        if field.name() != Some("files") {
            continue;
        }
        if parts.len() == MAX_FILES_PER_REQUEST {
            return Err(validation("files", "Too many files (max 10)"));
        }
        parts.push(read_part(&state, field).await?);
    }
    if parts.is_empty() {
        return Err(validation("files", "No files uploaded"));
    }

    let mut files = Vec::with_capacity(parts.len());
    for part in parts {
        let size = part.bytes.len();
        let cid = state
            .content_store
            .put_file(part.bytes, &part.file_name, &part.content_type)
            .await?;
        files.push(json!({
            "ipfsHash": cid,
            "ipfsUrl": state.content_store.url_for(&cid),
            "fileName": part.file_name,
            "fileSize": size,
            "mimeType": part.content_type,
        }));
    }

    Ok(success(
        StatusCode::OK,
        "Files uploaded successfully",
        json!({
            "files": files,
            "totalFiles": files.len(),
        }),
    ))
}

/// `GET /api/upload/ipfs/:cid`
///
/// Fetches pinned content through the gateway and embeds it in the
/// envelope: JSON stays structured, text passes through, anything else
/// is base64.
async fn retrieve_file(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
) -> Result<Response> {
    if cid.trim().is_empty() {
        return Err(ApiError::NotFound("File not found".into()));
    }

    let (bytes, content_type) = state.content_store.get(&cid).await?;
    let content_type =
        content_type.unwrap_or_else(|| "application/octet-stream".to_string());

    let (content, encoding) = if content_type.contains("json") {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => (value, "json"),
            Err(_) => (Value::String(BASE64.encode(&bytes)), "base64"),
        }
    } else {
        match String::from_utf8(bytes.clone()) {
            Ok(text) => (Value::String(text), "utf-8"),
            Err(_) => (Value::String(BASE64.encode(&bytes)), "base64"),
        }
    };

    Ok(success(
        StatusCode::OK,
        "File retrieved successfully",
        json!({
            "cid": cid,
            "content": content,
            "contentType": content_type,
            "encoding": encoding,
            "ipfsUrl": state.content_store.url_for(&cid),
        }),
    ))
}

/// `GET /api/upload/ipfs-url/:cid`
async fn ipfs_url(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
) -> Result<Response> {
    Ok(success(
        StatusCode::OK,
        "IPFS URL generated successfully",
        json!({
            "cid": cid,
            "ipfsUrl": state.content_store.url_for(&cid),
        }),
    ))
}
