//! Error types for filegate.

use thiserror::Error;

/// Coarse outcome class a caller-facing layer maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The caller could not be authenticated.
    Auth,
    /// The resource does not exist for this caller.
    NotFound,
    /// The request itself was malformed.
    Invalid,
    /// Something failed on our side or in a backend.
    Server,
}

/// Common error type for filegate.
///
/// The `Display` output carries diagnostic detail meant for the operational
/// log. Anything returned to a caller must go through [`GatewayError::public_message`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing, malformed, forged or expired credential.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// No record with this id is visible to the caller.
    ///
    /// Covers both "no such id" and "owned by someone else".
    #[error("file not found or not owned by caller")]
    NotFoundOrForbidden,

    /// The storage backend could not produce a signed URL.
    #[error("grant issuance failed: {0}")]
    GrantIssuanceFailed(String),

    /// The metadata store rejected a write.
    #[error("store write failed: {0}")]
    StoreWriteFailed(String),

    /// The metadata store failed while reading.
    #[error("store read failed: {0}")]
    StoreReadFailed(String),

    /// A caller-supplied field is missing or invalid.
    #[error("validation error: {0}")]
    ValidationFailed(String),

    /// Database connection or migration error.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Status class suggested for this error.
    pub fn status_class(&self) -> StatusClass {
        match self {
            GatewayError::Unauthenticated(_) => StatusClass::Auth,
            GatewayError::NotFoundOrForbidden => StatusClass::NotFound,
            GatewayError::ValidationFailed(_) => StatusClass::Invalid,
            GatewayError::GrantIssuanceFailed(_)
            | GatewayError::StoreWriteFailed(_)
            | GatewayError::StoreReadFailed(_)
            | GatewayError::Database(_)
            | GatewayError::Io(_)
            | GatewayError::Config(_) => StatusClass::Server,
        }
    }

    /// Message that is safe to show to the caller.
    pub fn public_message(&self) -> &str {
        match self {
            GatewayError::Unauthenticated(_) => "Invalid or expired token",
            GatewayError::NotFoundOrForbidden => "File not found or access denied",
            GatewayError::GrantIssuanceFailed(_) => "Failed to generate signed URL",
            GatewayError::StoreWriteFailed(_) => "Failed to store file metadata",
            GatewayError::StoreReadFailed(_) => "Failed to fetch files",
            GatewayError::ValidationFailed(msg) => msg,
            GatewayError::Database(_) | GatewayError::Io(_) | GatewayError::Config(_) => {
                "Internal server error"
            }
        }
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        GatewayError::Database(e.to_string())
    }
}

/// Result type alias for filegate operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
