//! Object storage access.
//!
//! Clients move file bytes straight to and from the storage backend using
//! short-lived signed URLs ("grants"). This module defines the backend seam
//! ([`ObjectStore`]), its S3-compatible and in-memory implementations, and the
//! [`GrantIssuer`] that applies the configured grant lifetimes.

mod grant;
mod memory;
mod s3;
pub mod sigv4;

pub use grant::{Grant, GrantIssuer, GrantTtls};
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::MAX_GRANT_TTL_SECS;

/// Content type signed into write grants when the caller gives none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Longest object key S3-compatible backends accept, in bytes.
pub const MAX_KEY_LENGTH: usize = 1024;

/// What a grant allows its holder to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOperation {
    /// Download the object.
    Read,
    /// Upload (overwrite) the object.
    Write,
}

impl GrantOperation {
    /// HTTP method the grant is signed for.
    pub fn http_method(self) -> &'static str {
        match self {
            GrantOperation::Read => "GET",
            GrantOperation::Write => "PUT",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GrantOperation::Read => "read",
            GrantOperation::Write => "write",
        }
    }
}

impl std::fmt::Display for GrantOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by an [`ObjectStore`] implementation.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("grant lifetime of {0}s is out of range")]
    InvalidTtl(u64),

    #[error("invalid storage endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("storage backend returned status {0}")]
    Status(u16),

    /// The backend refused the operation.
    #[error("storage backend rejected the operation: {0}")]
    Rejected(String),
}

/// A storage backend able to sign grants and delete objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Produce a URL allowing exactly `operation` on `key` for `ttl_secs` seconds.
    async fn presign(
        &self,
        key: &str,
        operation: GrantOperation,
        ttl_secs: u64,
        content_type: Option<&str>,
    ) -> Result<String, BackendError>;

    /// Remove an object. Removing a missing object succeeds.
    async fn delete_object(&self, key: &str) -> Result<(), BackendError>;
}

/// Reject keys and lifetimes no backend will sign.
pub(crate) fn check_grant_request(key: &str, ttl_secs: u64) -> Result<(), BackendError> {
    if key.is_empty() {
        return Err(BackendError::InvalidKey("key is empty".into()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(BackendError::InvalidKey(format!(
            "key is {} bytes, limit is {MAX_KEY_LENGTH}",
            key.len()
        )));
    }
    if ttl_secs == 0 || ttl_secs > MAX_GRANT_TTL_SECS {
        return Err(BackendError::InvalidTtl(ttl_secs));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_method() {
        assert_eq!(GrantOperation::Read.http_method(), "GET");
        assert_eq!(GrantOperation::Write.http_method(), "PUT");
        assert_eq!(GrantOperation::Write.to_string(), "write");
    }

    #[test]
    fn test_check_grant_request() {
        assert!(check_grant_request("uploads/u/2024-01-01/x-a.txt", 3600).is_ok());
        assert!(matches!(
            check_grant_request("", 3600),
            Err(BackendError::InvalidKey(_))
        ));
        assert!(matches!(
            check_grant_request(&"k".repeat(MAX_KEY_LENGTH + 1), 3600),
            Err(BackendError::InvalidKey(_))
        ));
        assert!(matches!(
            check_grant_request("a", 0),
            Err(BackendError::InvalidTtl(0))
        ));
        assert!(matches!(
            check_grant_request("a", MAX_GRANT_TTL_SECS + 1),
            Err(BackendError::InvalidTtl(_))
        ));
    }
}
