//! In-process object store for tests and local runs.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::sigv4::uri_encode;
use super::{check_grant_request, BackendError, GrantOperation, ObjectStore};

#[derive(Debug, Default)]
struct MemoryState {
    presign_calls: usize,
    delete_calls: usize,
    deleted: Vec<String>,
    failing_key_patterns: Vec<String>,
    fail_deletes: bool,
}

/// Object store that keeps no bytes.
///
/// Grants are `memory://` URLs describing what they would allow. Calls are
/// counted and failures can be injected per key.
#[derive(Debug)]
pub struct MemoryObjectStore {
    bucket: String,
    state: Mutex<MemoryState>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make grant issuance fail for every key containing `pattern`.
    pub fn fail_grants_matching(&self, pattern: impl Into<String>) {
        self.state().failing_key_patterns.push(pattern.into());
    }

    /// Make every deletion fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.state().fail_deletes = fail;
    }

    /// Number of presign calls seen, including failed ones.
    pub fn presign_calls(&self) -> usize {
        self.state().presign_calls
    }

    /// Number of delete calls seen, including failed ones.
    pub fn delete_calls(&self) -> usize {
        self.state().delete_calls
    }

    /// Keys successfully deleted, in call order.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.state().deleted.clone()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("files")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn presign(
        &self,
        key: &str,
        operation: GrantOperation,
        ttl_secs: u64,
        content_type: Option<&str>,
    ) -> Result<String, BackendError> {
        let mut state = self.state();
        state.presign_calls += 1;

        check_grant_request(key, ttl_secs)?;
        if state.failing_key_patterns.iter().any(|p| key.contains(p.as_str())) {
            return Err(BackendError::Rejected(format!("grant refused for {key}")));
        }

        let expires = Utc::now().timestamp() + ttl_secs as i64;
        let mut url = format!(
            "memory://{}/{}?op={operation}&expires={expires}",
            self.bucket,
            uri_encode(key, false)
        );
        if let (GrantOperation::Write, Some(content_type)) = (operation, content_type) {
            url.push_str("&content-type=");
            url.push_str(&urlencoding::encode(content_type));
        }
        Ok(url)
    }

    async fn delete_object(&self, key: &str) -> Result<(), BackendError> {
        let mut state = self.state();
        state.delete_calls += 1;

        if state.fail_deletes {
            return Err(BackendError::Status(503));
        }
        state.deleted.push(key.to_string());
        Ok(())
    }
}
