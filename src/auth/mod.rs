//! Bearer credential verification.
//!
//! Credentials are HS256 JWTs checked locally against a shared secret; no
//! network call is made on the request path.

mod token;

pub use token::{bearer_token, Claims, Subject, TokenVerifier};
