//! Drive handlers for the Web API.
//!
//! Every handler authenticates the caller, takes the owner from the token
//! and delegates to the shared storage backend.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderMap},
    response::Response,
    Json,
};
use futures::StreamExt;

use crate::storage::{normalize, FileStream};
use crate::upload::read_multipart;
use crate::web::dto::{
    ApiResponse, ExistsResponse, ListResponse, MkdirRequest, PathQuery, RenameRequest,
    RequiredPathQuery, SuccessResponse, UploadResponse, ValidatedJson, ValidatedQuery,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, LinkAuthUser};
use crate::DriveError;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are dropped, quotes and backslashes are replaced in the
/// plain `filename` parameter, and non-ASCII names are carried in an RFC 5987
/// `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// GET /api/drive/list - List a directory.
#[utoipa::path(
    get,
    path = "/drive/list",
    tag = "drive",
    params(PathQuery),
    responses(
        (status = 200, description = "Directory entries, directories first", body = ListResponse),
        (status = 400, description = "Invalid path"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<PathQuery>,
) -> Result<Json<ApiResponse<ListResponse>>, ApiError> {
    let backend = state.backend().await?;
    let entries = backend.list(auth.owner(), &query.path).await?;

    Ok(Json(ApiResponse::new(ListResponse { entries })))
}

/// GET /api/drive/download - Download a file.
///
/// The token may also be passed as a `token` query parameter.
#[utoipa::path(
    get,
    path = "/drive/download",
    tag = "drive",
    params(RequiredPathQuery),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid path or not a file"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download(
    State(state): State<Arc<AppState>>,
    auth: LinkAuthUser,
    ValidatedQuery(query): ValidatedQuery<RequiredPathQuery>,
) -> Result<Response<Body>, ApiError> {
    let backend = state.backend().await?;
    let FileStream { stream, size } = backend.get(auth.owner(), &query.path).await?;

    let normalized = normalize(&query.path)?;
    let filename = normalized.file_name().unwrap_or("download");

    let content_type = mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(filename),
        )
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// PUT /api/drive/file - Write one file from the raw request body.
///
/// The body is streamed to storage as it arrives.
#[utoipa::path(
    put,
    path = "/drive/file",
    tag = "drive",
    params(RequiredPathQuery),
    responses(
        (status = 200, description = "File stored", body = SuccessResponse),
        (status = 400, description = "Invalid path or file too large"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn put_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<RequiredPathQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let limits = state.upload_limits;
    let declared_len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared_len.is_some_and(|len| len > limits.max_file_size) {
        return Err(limits.too_large(&query.path).into());
    }

    // Bodies without a trustworthy length are cut off once they pass the limit
    let exceeded = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&exceeded);
    let max = limits.max_file_size;
    let mut received: u64 = 0;
    let stream = body
        .into_data_stream()
        .map(move |chunk| {
            let chunk = chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            received += chunk.len() as u64;
            if received > max {
                flag.store(true, Ordering::Relaxed);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "payload exceeds size limit",
                ));
            }
            Ok(chunk)
        })
        .boxed();

    let backend = state.backend().await?;
    match backend.put(auth.owner(), &query.path, stream).await {
        Err(_) if exceeded.load(Ordering::Relaxed) => {
            return Err(limits.too_large(&query.path).into());
        }
        result => result?,
    }

    tracing::info!(owner = auth.owner(), path = %query.path, "File stored");
    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// POST /api/drive/upload - Upload a batch of files.
///
/// Request body: multipart/form-data with an optional `path` (base
/// directory), optional `relativePaths` (one per line, paired with the files
/// in order), and one or more `files` / `file` parts.
#[utoipa::path(
    post,
    path = "/drive/upload",
    tag = "drive",
    responses(
        (status = 200, description = "Files stored", body = UploadResponse),
        (status = 400, description = "No files, too many files, file too large, or invalid path"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let limits = state.upload_limits;
    let batch = read_multipart(multipart, &limits).await?;

    let backend = state.backend().await?;
    let count = batch.ingest(backend.as_ref(), auth.owner(), &limits).await?;

    Ok(Json(ApiResponse::new(UploadResponse {
        success: true,
        count,
    })))
}

/// POST /api/drive/mkdir - Create a directory.
#[utoipa::path(
    post,
    path = "/drive/mkdir",
    tag = "drive",
    request_body = MkdirRequest,
    responses(
        (status = 200, description = "Directory exists", body = SuccessResponse),
        (status = 400, description = "Invalid path"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mkdir(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<MkdirRequest>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let backend = state.backend().await?;
    backend.mkdir(auth.owner(), &body.path).await?;

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// PUT /api/drive/rename - Rename a file or directory.
#[utoipa::path(
    put,
    path = "/drive/rename",
    tag = "drive",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Renamed", body = SuccessResponse),
        (status = 400, description = "Invalid path"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Source not found"),
        (status = 422, description = "Validation failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rename(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let backend = state.backend().await?;
    backend
        .rename(auth.owner(), &body.old_path, &body.new_path)
        .await?;

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// POST /api/drive/move - Move a file or directory within the caller's namespace.
#[utoipa::path(
    post,
    path = "/drive/move",
    tag = "drive",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Moved", body = SuccessResponse),
        (status = 400, description = "Invalid path"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Source not found"),
        (status = 422, description = "Validation failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn move_path(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let backend = state.backend().await?;
    backend
        .move_path(auth.owner(), &body.old_path, &body.new_path)
        .await?;

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// DELETE /api/drive/file - Delete a file or directory.
#[utoipa::path(
    delete,
    path = "/drive/file",
    tag = "drive",
    params(RequiredPathQuery),
    responses(
        (status = 200, description = "Deleted", body = SuccessResponse),
        (status = 400, description = "Invalid path"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Root cannot be deleted"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<RequiredPathQuery>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let backend = state.backend().await?;
    backend.delete(auth.owner(), &query.path).await.map_err(|e| {
        if matches!(e, DriveError::RootDeletionDenied) {
            tracing::warn!(owner = auth.owner(), "Root deletion attempt");
        }
        e
    })?;

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// GET /api/drive/exists - Check whether a path exists.
#[utoipa::path(
    get,
    path = "/drive/exists",
    tag = "drive",
    params(PathQuery),
    responses(
        (status = 200, description = "Existence flag", body = ExistsResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn exists(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<PathQuery>,
) -> Result<Json<ApiResponse<ExistsResponse>>, ApiError> {
    let backend = state.backend().await?;
    let exists = backend.exists(auth.owner(), &query.path).await;

    Ok(Json(ApiResponse::new(ExistsResponse { exists })))
}
