//! S3-compatible object store (AWS S3, Cloudflare R2, MinIO).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use url::Url;

use super::sigv4::{uri_encode, SigV4Signer, EMPTY_PAYLOAD_SHA256};
use super::{check_grant_request, BackendError, GrantOperation, ObjectStore};
use crate::config::StorageConfig;

/// Object store speaking the S3 REST API.
///
/// Grants are presigned locally; only deletion goes over the network.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: reqwest::Client,
    signer: SigV4Signer,
    scheme: String,
    /// `host[:port]` of the endpoint.
    authority: String,
    /// Path prefix of the endpoint, without trailing slash.
    base_path: String,
    bucket: String,
    path_style: bool,
}

impl S3ObjectStore {
    /// Build a store from configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self, BackendError> {
        let endpoint = config.resolved_endpoint().ok_or_else(|| {
            BackendError::InvalidEndpoint("no endpoint or account id configured".into())
        })?;
        let signer = SigV4Signer::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.region.clone(),
        );
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Self::new(client, signer, &endpoint, &config.bucket, config.path_style)
    }

    /// Build a store around an existing client and signer.
    pub fn new(
        client: reqwest::Client,
        signer: SigV4Signer,
        endpoint: &str,
        bucket: &str,
        path_style: bool,
    ) -> Result<Self, BackendError> {
        let url = Url::parse(endpoint)
            .map_err(|e| BackendError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| BackendError::InvalidEndpoint(format!("{endpoint}: missing host")))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        if bucket.is_empty() {
            return Err(BackendError::InvalidEndpoint("bucket name is empty".into()));
        }

        Ok(Self {
            client,
            signer,
            scheme: url.scheme().to_string(),
            authority,
            base_path: url.path().trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            path_style,
        })
    }

    /// Host header and canonical (encoded) path addressing `key`.
    fn locate(&self, key: &str) -> (String, String) {
        let key = uri_encode(key, false);
        if self.path_style {
            (
                self.authority.clone(),
                format!("{}/{}/{key}", self.base_path, uri_encode(&self.bucket, true)),
            )
        } else {
            (
                format!("{}.{}", self.bucket, self.authority),
                format!("{}/{key}", self.base_path),
            )
        }
    }

    fn presign_at(
        &self,
        key: &str,
        operation: GrantOperation,
        ttl_secs: u64,
        content_type: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, BackendError> {
        check_grant_request(key, ttl_secs)?;

        let (host, path) = self.locate(key);
        let mut signed = Vec::new();
        if let (GrantOperation::Write, Some(content_type)) = (operation, content_type) {
            signed.push(("content-type", content_type));
        }

        let query = self.signer.presign_query(
            operation.http_method(),
            &host,
            &path,
            ttl_secs,
            &signed,
            now,
        )?;

        Ok(format!("{}://{host}{path}?{query}", self.scheme))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn presign(
        &self,
        key: &str,
        operation: GrantOperation,
        ttl_secs: u64,
        content_type: Option<&str>,
    ) -> Result<String, BackendError> {
        self.presign_at(key, operation, ttl_secs, content_type, Utc::now())
    }

    async fn delete_object(&self, key: &str) -> Result<(), BackendError> {
        if key.is_empty() {
            return Err(BackendError::InvalidKey("key is empty".into()));
        }

        let (host, path) = self.locate(key);
        let headers =
            self.signer
                .sign_request("DELETE", &host, &path, &[], EMPTY_PAYLOAD_SHA256, Utc::now())?;

        let mut request = self
            .client
            .delete(format!("{}://{host}{path}", self.scheme));
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        // S3 answers 204 for deleted and missing keys alike; some compatible stores send 404.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(BackendError::Status(status.as_u16()))
        }
    }
}
