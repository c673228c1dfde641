//! Bearer token authentication.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{bearer_token, Subject, TokenVerifier};
use crate::web::error::ApiError;

/// Extractor for the authenticated caller.
///
/// Put it before any body extractor so that an unauthenticated request is
/// rejected before its body is read.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Subject);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::unauthorized("Missing or invalid authorization header"))?;

        // Set by `inject_verifier`
        let verifier = parts
            .extensions
            .get::<Arc<TokenVerifier>>()
            .ok_or_else(|| ApiError::internal("Token verifier not configured"))?;

        let subject = verifier.verify(token)?;
        Ok(AuthUser(subject))
    }
}

/// Middleware function to inject the token verifier into request extensions.
pub async fn inject_verifier(
    verifier: Arc<TokenVerifier>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(verifier);
    next.run(request).await
}
