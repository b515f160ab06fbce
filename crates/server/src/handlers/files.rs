//! File upload and download handlers.

use crate::error::{ApiError, ApiResult};
use crate::metrics::{
    BYTES_CACHED, BYTES_SERVED, CHECKSUM_MISMATCHES, DOWNLOAD_DURATION, FILES_CACHED,
    FILES_NOT_FOUND, FILES_SERVED, UPLOAD_DURATION,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Multipart, Query, State};
use axum::http::HeaderMap;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use stash_cache::CacheError;
use stash_core::{ContentHash, FileId};
use std::time::Instant;
use tokio::io::AsyncWriteExt;

/// Upload response body.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub msg: String,
    pub id: String,
}

/// Download query parameters.
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub id: String,
}

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}

fn size_gate_error(min: u64, max: u64) -> ApiError {
    ApiError::BadRequest(format!(
        "file size must be between {min} and {max} bytes"
    ))
}

/// POST /upload - stage a multipart file upload to disk, then chunk it
/// into the cache.
#[tracing::instrument(skip(state, headers, multipart), fields(file_id))]
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let start = Instant::now();
    let server = &state.config.server;

    // Gate on the declared length before touching the body. The
    // declared length includes multipart framing, so it can only
    // over-count; anything already above the ceiling is rejected early.
    if let Some(declared) = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        && declared > server.max_file_bytes.saturating_add(MULTIPART_SLACK)
    {
        return Err(size_gate_error(server.min_file_bytes, server.max_file_bytes));
    }

    let mut field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
        {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => {
                return Err(ApiError::BadRequest(
                    "file not present in request".to_string(),
                ));
            }
        }
    };

    let file_id = FileId::sanitize(field.file_name().unwrap_or_default());
    tracing::Span::current().record("file_id", file_id.as_str());

    // Stage the upload to disk before chunking, hashing as it lands so
    // the cached entry can be verified against what was received.
    let staged = tempfile::NamedTempFile::new_in(&server.uploads_dir)?;
    let mut staged_file = tokio::fs::File::from_std(staged.reopen()?);
    let mut hasher = ContentHash::hasher();
    let mut staged_size: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        staged_size += chunk.len() as u64;
        if staged_size > server.max_file_bytes {
            return Err(size_gate_error(server.min_file_bytes, server.max_file_bytes));
        }
        hasher.update(&chunk);
        staged_file.write_all(&chunk).await?;
    }
    staged_file.flush().await?;
    let staged_checksum = hasher.finalize();

    if staged_size < server.min_file_bytes {
        return Err(size_gate_error(server.min_file_bytes, server.max_file_bytes));
    }

    let reader = tokio::fs::File::open(staged.path()).await?;
    let receipt = state.cache.write(&file_id, reader).await?;

    // The staged digest and the digest computed while chunking must
    // agree; a divergence means the bytes changed between staging and
    // storage.
    if receipt.checksum != staged_checksum {
        tracing::error!(
            file_id = %file_id,
            staged = %staged_checksum,
            cached = %receipt.checksum,
            "cached checksum does not match staged upload"
        );
        return Err(ApiError::Internal(
            "unable to cache file: checksum verification failed".to_string(),
        ));
    }

    FILES_CACHED.inc();
    BYTES_CACHED.inc_by(staged_size);
    UPLOAD_DURATION.observe(start.elapsed().as_secs_f64());
    tracing::info!(file_id = %file_id, bytes = staged_size, chunks = receipt.chunk_count, "file cached");

    Ok(Json(UploadResponse {
        msg: "File uploaded successfully".to_string(),
        id: receipt.file_id.to_string(),
    }))
}

/// Extra request length allowed beyond the file ceiling for multipart
/// boundaries and part headers.
const MULTIPART_SLACK: u64 = 64 * 1024;

/// GET /download?id= - reassemble a cached file and return it as an
/// attachment.
#[tracing::instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> ApiResult<Response> {
    let start = Instant::now();
    let id =
        FileId::parse(&params.id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let bytes = match state.cache.read(&id).await {
        Ok(bytes) => bytes,
        Err(e @ CacheError::NotFound(_)) => {
            FILES_NOT_FOUND.inc();
            return Err(e.into());
        }
        Err(e @ CacheError::Inconsistent { .. }) => {
            CHECKSUM_MISMATCHES.inc();
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    FILES_SERVED.inc();
    BYTES_SERVED.inc_by(bytes.len() as u64);
    DOWNLOAD_DURATION.observe(start.elapsed().as_secs_f64());
    tracing::info!(file_id = %id, bytes = bytes.len(), "file served");

    let headers = [
        (CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{id}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// GET /v1/health - backend connectivity probe. Intentionally
/// unauthenticated for load balancer probes.
pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.kv.health_check().await {
        Ok(()) => Json(HealthResponse {
            status: "ok",
            backend: state.kv.backend_name(),
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "backend health check failed");
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    backend: state.kv.backend_name(),
                }),
            )
                .into_response()
        }
    }
}
