//! File lifecycle orchestration.
//!
//! Composes the metadata store and grant issuance under ownership checks:
//! - Upload initiation (write grant first, then the metadata row)
//! - Download authorization and signed links
//! - Listing with per-file signed links
//! - Deletion (best-effort object removal, authoritative metadata removal)

mod key;
mod service;
mod validation;

pub use key::object_key;
pub use service::{DownloadGrant, FileListing, FileService, ListedFile, UploadRequest, UploadTicket};
pub use validation::{
    display_name_length, mime_type_length, no_control_chars, no_path_separators, not_empty_trimmed,
};

/// Maximum length for a display name (in characters).
pub const MAX_DISPLAY_NAME_LENGTH: usize = 255;

/// Maximum length for a declared MIME type.
pub const MAX_MIME_TYPE_LENGTH: usize = 255;
