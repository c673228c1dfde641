//! Configuration management for filegate.

use std::path::Path;

use serde::Deserialize;

use crate::db::MAX_PAGE_SIZE;
use crate::{GatewayError, Result};

/// Longest expiry an S3 SigV4 presigned URL may carry (7 days).
pub const MAX_GRANT_TTL_SECS: u64 = 604_800;

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Metadata database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path.
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    "data/filegate.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Bearer token verification configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret (required).
    #[serde(default)]
    pub jwt_secret: String,
    /// Expected `aud` claim. Not checked when unset.
    #[serde(default)]
    pub audience: Option<String>,
    /// Clock skew tolerated on `exp`/`nbf`, in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
}

/// Which object store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// S3-compatible HTTP endpoint (AWS S3, Cloudflare R2, MinIO).
    S3,
    /// In-process store; nothing is persisted.
    Memory,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackendKind,
    /// Endpoint URL, e.g. `https://s3.us-east-1.amazonaws.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Cloudflare account id; used to derive the R2 endpoint when `endpoint` is unset.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// Address objects as `{endpoint}/{bucket}/{key}` instead of `{bucket}.{host}/{key}`.
    #[serde(default = "default_path_style")]
    pub path_style: bool,
    /// Timeout for backend HTTP calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend() -> StorageBackendKind {
    StorageBackendKind::S3
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_bucket() -> String {
    "files".to_string()
}

fn default_path_style() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    10
}

impl StorageConfig {
    /// Endpoint URL after applying the R2 account shortcut.
    pub fn resolved_endpoint(&self) -> Option<String> {
        match (&self.endpoint, &self.account_id) {
            (Some(endpoint), _) if !endpoint.is_empty() => Some(endpoint.clone()),
            (_, Some(account)) if !account.is_empty() => {
                Some(format!("https://{account}.r2.cloudflarestorage.com"))
            }
            _ => None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: None,
            account_id: None,
            region: default_region(),
            bucket: default_bucket(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            path_style: default_path_style(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Lifetimes of issued grants, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantsConfig {
    /// Write grants returned by upload initiation.
    #[serde(default = "default_upload_ttl")]
    pub upload_ttl_secs: u64,
    /// Read grants returned by direct download.
    #[serde(default = "default_download_ttl")]
    pub download_ttl_secs: u64,
    /// Read grants attached to listings and signed-url requests.
    #[serde(default = "default_link_ttl")]
    pub link_ttl_secs: u64,
}

fn default_upload_ttl() -> u64 {
    7200
}

fn default_download_ttl() -> u64 {
    86400
}

fn default_link_ttl() -> u64 {
    3600
}

impl Default for GrantsConfig {
    fn default() -> Self {
        Self {
            upload_ttl_secs: default_upload_ttl(),
            download_ttl_secs: default_download_ttl(),
            link_ttl_secs: default_link_ttl(),
        }
    }
}

/// Listing pagination configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Page size used when the caller does not send a usable `limit`.
    ///
    /// Requests are always capped at [`crate::db::MAX_PAGE_SIZE`].
    #[serde(default = "default_list_limit")]
    pub default_limit: i64,
}

fn default_list_limit() -> i64 {
    50
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_list_limit(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file written alongside stdout.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub grants: GrantsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GatewayError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GatewayError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Empty values are ignored. Supported variables:
    /// - `FILEGATE_JWT_SECRET`
    /// - `FILEGATE_DATABASE_PATH`
    /// - `FILEGATE_S3_ENDPOINT`, `FILEGATE_S3_ACCOUNT_ID`, `FILEGATE_S3_REGION`, `FILEGATE_S3_BUCKET`
    /// - `FILEGATE_S3_ACCESS_KEY_ID`, `FILEGATE_S3_SECRET_ACCESS_KEY`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get("FILEGATE_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = get("FILEGATE_DATABASE_PATH") {
            self.database.path = v;
        }
        if let Some(v) = get("FILEGATE_S3_ENDPOINT") {
            self.storage.endpoint = Some(v);
        }
        if let Some(v) = get("FILEGATE_S3_ACCOUNT_ID") {
            self.storage.account_id = Some(v);
        }
        if let Some(v) = get("FILEGATE_S3_REGION") {
            self.storage.region = v;
        }
        if let Some(v) = get("FILEGATE_S3_BUCKET") {
            self.storage.bucket = v;
        }
        if let Some(v) = get("FILEGATE_S3_ACCESS_KEY_ID") {
            self.storage.access_key_id = v;
        }
        if let Some(v) = get("FILEGATE_S3_SECRET_ACCESS_KEY") {
            self.storage.secret_access_key = v;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(GatewayError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via FILEGATE_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }

        for (name, ttl) in [
            ("upload_ttl_secs", self.grants.upload_ttl_secs),
            ("download_ttl_secs", self.grants.download_ttl_secs),
            ("link_ttl_secs", self.grants.link_ttl_secs),
        ] {
            if ttl == 0 || ttl > MAX_GRANT_TTL_SECS {
                return Err(GatewayError::Config(format!(
                    "grants.{name} must be between 1 and {MAX_GRANT_TTL_SECS}"
                )));
            }
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.listing.default_limit) {
            return Err(GatewayError::Config(format!(
                "listing.default_limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        if self.storage.backend == StorageBackendKind::S3 {
            if self.storage.resolved_endpoint().is_none() {
                return Err(GatewayError::Config(
                    "storage.endpoint or storage.account_id must be set for the s3 backend"
                        .to_string(),
                ));
            }
            if self.storage.bucket.is_empty() {
                return Err(GatewayError::Config("storage.bucket is empty".to_string()));
            }
            if self.storage.access_key_id.is_empty() || self.storage.secret_access_key.is_empty()
            {
                return Err(GatewayError::Config(
                    "storage credentials are not set".to_string(),
                ));
            }
        }

        Ok(())
    }
}
