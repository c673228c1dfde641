//! Router configuration for the HTTP API.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth::TokenVerifier;

use super::error::ApiError;
use super::handlers::{delete_file, download, list_files, signed_url, upload, AppState};
use super::middleware::{create_cors_layer, inject_verifier};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    verifier: Arc<TokenVerifier>,
    cors_origins: &[String],
) -> Router {
    let file_routes = Router::new()
        .route("/upload", post(upload))
        .route("/download", get(download))
        .route("/files", get(list_files))
        .route("/files/:id/signed-url", get(signed_url))
        .route("/files/:id", delete(delete_file));

    Router::new()
        .merge(file_routes)
        .merge(create_health_router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    inject_verifier(verifier.clone(), req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
