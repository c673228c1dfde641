//! File lifecycle service.
//!
//! Each operation is a single request/response over injected collaborators.
//! No state is kept between calls; the metadata store is the source of truth
//! for existence and ownership.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::key::object_key;
use super::validation::{
    display_name_length, mime_type_length, no_control_chars, no_path_separators,
    not_empty_trimmed,
};
use crate::auth::Subject;
use crate::db::{FileRecord, MetadataStore, NewFileRecord, Page};
use crate::storage::{Grant, GrantIssuer, GrantTtls, ObjectStore, MAX_KEY_LENGTH};
use crate::{GatewayError, Result};

/// Request data for upload initiation.
#[derive(Debug, Clone, Validate)]
pub struct UploadRequest {
    /// File name shown to the owner; becomes part of the object key.
    #[validate(
        custom(function = "display_name_length"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars"),
        custom(function = "no_path_separators")
    )]
    pub display_name: String,
    /// Declared MIME type. Signed into the write grant.
    #[validate(
        custom(function = "mime_type_length"),
        custom(function = "no_control_chars")
    )]
    pub mime_type: Option<String>,
    /// Declared size in bytes.
    #[validate(range(min = 0, message = "must not be negative"))]
    pub byte_size: Option<i64>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            mime_type: None,
            byte_size: None,
        }
    }

    /// Set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Set the size in bytes.
    pub fn with_byte_size(mut self, byte_size: i64) -> Self {
        self.byte_size = Some(byte_size);
        self
    }
}

/// Result of upload initiation.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    pub id: String,
    /// Presigned PUT URL for the object.
    pub upload_url: String,
    pub object_key: String,
    pub expires_at: DateTime<Utc>,
}

/// A read grant together with the record it was issued for.
#[derive(Debug, Clone)]
pub struct DownloadGrant {
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
    pub record: FileRecord,
}

impl DownloadGrant {
    fn new(grant: Grant, record: FileRecord) -> Self {
        Self {
            download_url: grant.url,
            expires_at: grant.expires_at,
            record,
        }
    }
}

/// One listing entry. `grant` is `None` when signing failed for this file.
#[derive(Debug, Clone)]
pub struct ListedFile {
    pub record: FileRecord,
    pub grant: Option<Grant>,
}

/// A page of the caller's files.
#[derive(Debug, Clone)]
pub struct FileListing {
    pub files: Vec<ListedFile>,
    /// Total number of files the caller owns.
    pub total: i64,
    /// Effective (clamped) page size.
    pub limit: i64,
    pub offset: i64,
}

/// File service composing metadata and storage under ownership checks.
#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
    grants: GrantIssuer,
}

impl FileService {
    /// Create a new FileService.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        ttls: GrantTtls,
    ) -> Self {
        let grants = GrantIssuer::new(objects.clone(), ttls);
        Self {
            store,
            objects,
            grants,
        }
    }

    /// Start an upload.
    ///
    /// The write grant is issued before the record is written, so a signing
    /// failure never leaves a record behind. A store failure after signing
    /// leaves an unused grant, which expires on its own.
    pub async fn initiate_upload(
        &self,
        subject: &Subject,
        request: UploadRequest,
    ) -> Result<UploadTicket> {
        request.validate().map_err(validation_failed)?;

        let id = Uuid::new_v4().to_string();
        let key = object_key(
            subject.id(),
            Utc::now().date_naive(),
            &id,
            &request.display_name,
        );
        // Names are bounded in characters, keys in bytes.
        if key.len() > MAX_KEY_LENGTH {
            return Err(GatewayError::ValidationFailed(
                "file_name is too long".to_string(),
            ));
        }

        let grant = self
            .grants
            .upload_grant(&key, request.mime_type.as_deref())
            .await?;

        let record = self
            .store
            .insert(NewFileRecord {
                id: id.clone(),
                owner_id: subject.id().to_string(),
                object_key: key,
                display_name: request.display_name,
                mime_type: request.mime_type,
                byte_size: request.byte_size,
            })
            .await
            .map_err(|e| {
                error!(file_id = %id, error = %e, "metadata insert failed after issuing write grant");
                e
            })?;

        info!(file_id = %record.id, owner = subject.id(), "upload initiated");

        Ok(UploadTicket {
            id: record.id,
            upload_url: grant.url,
            object_key: record.object_key,
            expires_at: grant.expires_at,
        })
    }

    /// Long-lived read grant for a direct download.
    ///
    /// The object is not checked for existence; a never-finished upload
    /// surfaces when the client uses the URL.
    pub async fn authorize_download(
        &self,
        subject: &Subject,
        file_id: &str,
    ) -> Result<DownloadGrant> {
        let record = self.store.get_owned(file_id, subject.id()).await?;
        let grant = self.grants.download_grant(&record.object_key).await?;
        Ok(DownloadGrant::new(grant, record))
    }

    /// Short-lived read grant for an explicit signed-url request.
    pub async fn signed_url(&self, subject: &Subject, file_id: &str) -> Result<DownloadGrant> {
        let record = self.store.get_owned(file_id, subject.id()).await?;
        let grant = self.grants.link_grant(&record.object_key).await?;
        Ok(DownloadGrant::new(grant, record))
    }

    /// List the caller's files, newest first, each with a short-lived read grant.
    ///
    /// Grants are issued concurrently. A file whose grant fails is still
    /// listed, without a grant.
    pub async fn list(&self, subject: &Subject, page: Page) -> Result<FileListing> {
        let (records, total) = self.store.list_owned(subject.id(), page).await?;

        let files = join_all(records.into_iter().map(|record| self.with_link(record))).await;

        Ok(FileListing {
            files,
            total,
            limit: page.limit(),
            offset: page.offset(),
        })
    }

    async fn with_link(&self, record: FileRecord) -> ListedFile {
        match self.grants.link_grant(&record.object_key).await {
            Ok(grant) => ListedFile {
                record,
                grant: Some(grant),
            },
            Err(e) => {
                warn!(file_id = %record.id, error = %e, "listing file without signed URL");
                ListedFile {
                    record,
                    grant: None,
                }
            }
        }
    }

    /// Delete a file.
    ///
    /// Object removal is best-effort: its failure is logged and the metadata
    /// row is removed anyway. Metadata removal failure is returned.
    pub async fn delete(&self, subject: &Subject, file_id: &str) -> Result<()> {
        let record = self.store.get_owned(file_id, subject.id()).await?;

        if let Err(e) = self.objects.delete_object(&record.object_key).await {
            warn!(
                file_id = %record.id,
                key = %record.object_key,
                error = %e,
                "object delete failed, orphaned object left in storage"
            );
        }

        self.store.delete_owned(&record.id, subject.id()).await?;

        info!(file_id = %record.id, owner = subject.id(), "file deleted");
        Ok(())
    }
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("ttls", &self.grants.ttls())
            .finish_non_exhaustive()
    }
}

/// Field name as callers send it.
fn wire_name(field: &str) -> &str {
    match field {
        "display_name" => "file_name",
        "byte_size" => "file_size",
        other => other,
    }
}

fn validation_failed(errors: ValidationErrors) -> GatewayError {
    let fields: BTreeMap<_, _> = errors.field_errors().into_iter().collect();

    let message = fields
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                format!(
                    "{} {}",
                    wire_name(field),
                    e.message.as_deref().unwrap_or("is invalid")
                )
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    GatewayError::ValidationFailed(message)
}
