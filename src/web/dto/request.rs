//! Request DTOs for the HTTP API.

use serde::Deserialize;

use crate::db::Page;

/// Query parameters for `GET /download`.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// ID of the file to download.
    #[serde(default)]
    pub file_id: Option<String>,
}

impl DownloadQuery {
    /// The file id, if one was given and is not blank.
    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Query parameters for `GET /files`.
///
/// Kept as raw strings: a value that does not parse falls back to the
/// default instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
}

impl ListQuery {
    /// Resolve into a clamped [`Page`].
    pub fn page(&self, default_limit: i64) -> Page {
        let limit = parse_or(self.limit.as_deref(), default_limit);
        let offset = parse_or(self.offset.as_deref(), 0);
        Page::new(limit, offset)
    }
}

/// Multipart fields of `POST /upload`.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<String>,
}

impl UploadForm {
    /// Declared size; a value that does not parse counts as 0.
    pub fn file_size(&self) -> Option<i64> {
        self.file_size.as_deref().map(|s| parse_or(Some(s), 0))
    }
}

fn parse_or(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default)
}
