//! HTTP API for filegate.
//!
//! Thin axum layer over [`crate::file::FileService`]: bearer authentication,
//! request parsing and the JSON envelope.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
