//! Response DTOs for the HTTP API.
//!
//! Every success body carries `success: true`; error bodies are built by
//! [`crate::web::error::ApiError`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::db::FileRecord;
use crate::file::{DownloadGrant, FileListing, ListedFile, UploadTicket};

/// RFC 3339 with millisecond precision, as stored.
pub fn to_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// File metadata as exposed to callers.
#[derive(Debug, Serialize)]
pub struct FileMetadataResponse {
    pub id: String,
    pub user_id: String,
    /// Object key in the storage bucket.
    pub file_path: String,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub created_at: String,
}

impl From<FileRecord> for FileMetadataResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            created_at: to_rfc3339(&record.created_at),
            id: record.id,
            user_id: record.owner_id,
            file_path: record.object_key,
            file_name: record.display_name,
            mime_type: record.mime_type,
            file_size: record.byte_size,
        }
    }
}

/// `POST /upload` response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file_id: String,
    pub upload_url: String,
    pub file_path: String,
}

impl From<UploadTicket> for UploadResponse {
    fn from(ticket: UploadTicket) -> Self {
        Self {
            success: true,
            file_id: ticket.id,
            upload_url: ticket.upload_url,
            file_path: ticket.object_key,
        }
    }
}

/// `GET /download` response.
#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub download_url: String,
    pub file_metadata: FileMetadataResponse,
}

impl From<DownloadGrant> for DownloadResponse {
    fn from(grant: DownloadGrant) -> Self {
        Self {
            success: true,
            download_url: grant.download_url,
            file_metadata: grant.record.into(),
        }
    }
}

/// One entry of `GET /files`.
///
/// The signed URL fields are absent when signing failed for this file.
#[derive(Debug, Serialize)]
pub struct ListedFileResponse {
    #[serde(flatten)]
    pub metadata: FileMetadataResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_sign_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_sign_url_expire: Option<String>,
}

impl From<ListedFile> for ListedFileResponse {
    fn from(file: ListedFile) -> Self {
        let (file_sign_url, file_sign_url_expire) = match file.grant {
            Some(grant) => (Some(grant.url), Some(to_rfc3339(&grant.expires_at))),
            None => (None, None),
        };
        Self {
            metadata: file.record.into(),
            file_sign_url,
            file_sign_url_expire,
        }
    }
}

/// `GET /files` response.
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub success: bool,
    pub files: Vec<ListedFileResponse>,
    /// Total number of files the caller owns.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl From<FileListing> for FileListResponse {
    fn from(listing: FileListing) -> Self {
        Self {
            success: true,
            files: listing.files.into_iter().map(Into::into).collect(),
            total: listing.total,
            limit: listing.limit,
            offset: listing.offset,
        }
    }
}

/// `GET /files/{id}/signed-url` response.
#[derive(Debug, Serialize)]
pub struct SignedUrlResponse {
    pub success: bool,
    pub file_id: String,
    pub file_sign_url: String,
    pub file_sign_url_expire: String,
}

impl From<DownloadGrant> for SignedUrlResponse {
    fn from(grant: DownloadGrant) -> Self {
        Self {
            success: true,
            file_id: grant.record.id,
            file_sign_url: grant.download_url,
            file_sign_url_expire: to_rfc3339(&grant.expires_at),
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
