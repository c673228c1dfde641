//! File handlers.
//!
//! Every handler takes [`AuthUser`] first, so the bearer token is checked
//! before the body is read or any backend is touched.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::file::UploadRequest;
use crate::web::dto::{
    DownloadQuery, DownloadResponse, FileListResponse, ListQuery, MessageResponse,
    SignedUrlResponse, UploadForm, UploadResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /upload - Start an upload and return a presigned PUT URL.
///
/// Takes a multipart form with `file_name`, `mime_type` and `file_size`.
/// The file bytes themselves go straight to storage via the returned URL.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    AuthUser(subject): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected upload body: {}", e);
        ApiError::bad_request("Expected a multipart form body")
    })?;

    let form = read_upload_form(&mut multipart).await?;

    let mut request = UploadRequest::new(form.file_name.clone().unwrap_or_default());
    if let Some(mime_type) = form.mime_type.as_deref().filter(|m| !m.is_empty()) {
        request = request.with_mime_type(mime_type);
    }
    if let Some(size) = form.file_size() {
        request = request.with_byte_size(size);
    }

    let ticket = state.files.initiate_upload(&subject, request).await?;
    Ok(Json(ticket.into()))
}

async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        tracing::debug!("Malformed multipart body: {}", e);
        ApiError::bad_request("Malformed multipart body")
    };

    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let slot = match field.name() {
            Some("file_name") => &mut form.file_name,
            Some("mime_type") => &mut form.mime_type,
            Some("file_size") => &mut form.file_size,
            _ => continue,
        };
        *slot = Some(field.text().await.map_err(invalid)?);
    }
    Ok(form)
}

/// GET /download?file_id= - Presigned GET URL for one of the caller's files.
pub async fn download(
    State(state): State<Arc<AppState>>,
    AuthUser(subject): AuthUser,
    Query(query): Query<DownloadQuery>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let file_id = query
        .file_id()
        .ok_or_else(|| ApiError::bad_request("file_id is required"))?;

    let grant = state.files.authorize_download(&subject, file_id).await?;
    Ok(Json(grant.into()))
}

/// GET /files - List the caller's files, newest first.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(subject): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    let page = query.page(state.default_limit);
    let listing = state.files.list(&subject, page).await?;
    Ok(Json(listing.into()))
}

/// GET /files/:id/signed-url - Short-lived presigned GET URL.
pub async fn signed_url(
    State(state): State<Arc<AppState>>,
    AuthUser(subject): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    let grant = state.files.signed_url(&subject, &file_id).await?;
    Ok(Json(grant.into()))
}

/// DELETE /files/:id - Delete a file and its metadata.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(subject): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.files.delete(&subject, &file_id).await?;
    Ok(Json(MessageResponse::new("File deleted successfully")))
}
