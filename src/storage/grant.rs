//! Grant issuance with configured lifetimes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::{GrantOperation, ObjectStore, DEFAULT_CONTENT_TYPE};
use crate::config::GrantsConfig;
use crate::{GatewayError, Result};

/// A signed URL and the moment it stops working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub url: String,
    pub operation: GrantOperation,
    pub expires_at: DateTime<Utc>,
}

/// Lifetimes applied to each kind of grant, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantTtls {
    pub upload: u64,
    pub download: u64,
    pub link: u64,
}

impl Default for GrantTtls {
    fn default() -> Self {
        Self::from(&GrantsConfig::default())
    }
}

impl From<&GrantsConfig> for GrantTtls {
    fn from(config: &GrantsConfig) -> Self {
        Self {
            upload: config.upload_ttl_secs,
            download: config.download_ttl_secs,
            link: config.link_ttl_secs,
        }
    }
}

/// Issues grants from an [`ObjectStore`].
///
/// A failed issuance is reported once as [`GatewayError::GrantIssuanceFailed`];
/// nothing is retried.
#[derive(Clone)]
pub struct GrantIssuer {
    backend: Arc<dyn ObjectStore>,
    ttls: GrantTtls,
}

impl GrantIssuer {
    pub fn new(backend: Arc<dyn ObjectStore>, ttls: GrantTtls) -> Self {
        Self { backend, ttls }
    }

    pub fn ttls(&self) -> GrantTtls {
        self.ttls
    }

    /// Issue a grant for exactly `operation` on `key`.
    pub async fn issue(
        &self,
        key: &str,
        operation: GrantOperation,
        ttl_secs: u64,
        content_type: Option<&str>,
    ) -> Result<Grant> {
        // Taken before signing so the reported expiry never outlives the URL.
        let issued_at = Utc::now();

        let url = self
            .backend
            .presign(key, operation, ttl_secs, content_type)
            .await
            .map_err(|e| {
                warn!(key, %operation, ttl_secs, error = %e, "grant issuance failed");
                GatewayError::GrantIssuanceFailed(e.to_string())
            })?;

        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Ok(Grant {
            url,
            operation,
            expires_at: issued_at + Duration::seconds(ttl),
        })
    }

    /// Write grant for a new upload.
    pub async fn upload_grant(&self, key: &str, content_type: Option<&str>) -> Result<Grant> {
        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);
        self.issue(key, GrantOperation::Write, self.ttls.upload, Some(content_type))
            .await
    }

    /// Read grant for a direct download.
    pub async fn download_grant(&self, key: &str) -> Result<Grant> {
        self.issue(key, GrantOperation::Read, self.ttls.download, None)
            .await
    }

    /// Short-lived read grant for listings and signed-url requests.
    pub async fn link_grant(&self, key: &str) -> Result<Grant> {
        self.issue(key, GrantOperation::Read, self.ttls.link, None)
            .await
    }
}
