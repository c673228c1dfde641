//! Shared helpers for HTTP API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use filegate::auth::Claims;
use filegate::db::SqlFileStore;
use filegate::storage::{GrantTtls, MemoryObjectStore};
use filegate::web::{create_router, AppState};
use filegate::{Database, FileService, TokenVerifier};
use jsonwebtoken::{encode, EncodingKey, Header};

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// A server over an in-memory database and object store.
pub struct TestContext {
    pub server: TestServer,
    pub objects: Arc<MemoryObjectStore>,
    pub db: Database,
}

impl TestContext {
    /// Number of metadata rows, across all owners.
    pub async fn row_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to count rows")
    }
}

/// Create a test server with an in-memory database.
pub async fn create_test_server() -> TestContext {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let objects = Arc::new(MemoryObjectStore::default());

    let files = FileService::new(
        Arc::new(SqlFileStore::new(db.pool().clone())),
        objects.clone(),
        GrantTtls::default(),
    );
    let app_state = Arc::new(AppState::new(files, 50));
    let verifier = Arc::new(TokenVerifier::new(TEST_SECRET, None, 0));

    let router = create_router(app_state, verifier, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestContext {
        server,
        objects,
        db,
    }
}

/// Mint a token for `sub` that expires `expires_in` seconds from now.
pub fn token_with_expiry(sub: &str, expires_in: i64, secret: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        email: Some(format!("{sub}@example.com")),
        iat: Some(now as u64),
        exp: (now + expires_in) as u64,
        aud: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to encode token")
}

/// A valid one-hour token for `sub`.
pub fn token_for(sub: &str) -> String {
    token_with_expiry(sub, 3600, TEST_SECRET)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
