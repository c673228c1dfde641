//! File metadata entities.

use chrono::{DateTime, Utc};

/// Largest page `list_owned` will ever return.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Stored metadata for one file.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileRecord {
    /// File ID, assigned at upload initiation.
    pub id: String,
    /// Subject that initiated the upload.
    #[sqlx(rename = "user_id")]
    pub owner_id: String,
    /// Key of the object in the storage bucket.
    #[sqlx(rename = "file_path")]
    pub object_key: String,
    /// Caller-supplied file name.
    #[sqlx(rename = "file_name")]
    pub display_name: String,
    /// Declared MIME type; never checked against the stored bytes.
    pub mime_type: Option<String>,
    /// Declared size in bytes; never checked against the stored bytes.
    #[sqlx(rename = "file_size")]
    pub byte_size: Option<i64>,
    /// Set by the store on insert.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub id: String,
    pub owner_id: String,
    pub object_key: String,
    pub display_name: String,
    pub mime_type: Option<String>,
    pub byte_size: Option<i64>,
}

/// A clamped window into an owner's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    limit: i64,
    offset: i64,
}

impl Page {
    /// `limit` is clamped into `1..=MAX_PAGE_SIZE`; a negative `offset` becomes 0.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset: offset.max(0),
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}
