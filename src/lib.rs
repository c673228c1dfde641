//! filegate - authenticated file gateway.
//!
//! Clients never stream file bytes through the gateway. It verifies bearer
//! tokens, keeps owner-scoped file metadata in SQLite and hands out
//! short-lived presigned URLs for an S3-compatible bucket.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod storage;
pub mod web;

pub use auth::{Subject, TokenVerifier};
pub use config::Config;
pub use db::Database;
pub use error::{GatewayError, Result};
pub use file::FileService;
