//! JWT verification against a pre-shared secret.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{GatewayError, Result};

/// Claims read from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    /// Email address, when the issuer includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Expiration timestamp.
    pub exp: u64,
    /// Audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// The authenticated caller.
///
/// Only produced by [`TokenVerifier::verify`], so holding one means the
/// credential was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    id: String,
    email: Option<String>,
}

impl Subject {
    #[cfg(test)]
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    /// Stable user identifier taken from the `sub` claim.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Verifies bearer tokens with an immutable secret supplied at construction.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for HS256 tokens signed with `secret`.
    ///
    /// `audience` is only enforced when given. `leeway_secs` applies to `exp` and `nbf`.
    pub fn new(secret: &str, audience: Option<&str>, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a raw token and return the caller it identifies.
    pub fn verify(&self, credential: &str) -> Result<Subject> {
        if credential.is_empty() {
            return Err(GatewayError::Unauthenticated("empty credential".into()));
        }

        let data = decode::<Claims>(credential, &self.decoding_key, &self.validation)
            .map_err(|e| GatewayError::Unauthenticated(format!("token rejected: {e}")))?;

        let claims = data.claims;
        if claims.sub.is_empty() || claims.sub.contains('/') || claims.sub.chars().any(char::is_control)
        {
            return Err(GatewayError::Unauthenticated(
                "token subject is not a usable user id".into(),
            ));
        }

        Ok(Subject {
            id: claims.sub,
            email: claims.email,
        })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
