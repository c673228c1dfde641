//! API handlers.

pub mod files;

pub use files::*;

use crate::file::FileService;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// File lifecycle operations.
    pub files: FileService,
    /// Page size for listings that do not ask for one.
    pub default_limit: i64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(files: FileService, default_limit: i64) -> Self {
        Self {
            files,
            default_limit,
        }
    }
}
