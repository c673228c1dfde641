//! Owner-scoped file metadata store.

use async_trait::async_trait;

use super::{DbPool, FileRecord, NewFileRecord, Page};
use crate::{GatewayError, Result};

const COLUMNS: &str = "id, user_id, file_path, file_name, mime_type, file_size, created_at";

/// Persistence of [`FileRecord`]s.
///
/// Every lookup and mutation is filtered by the owner taken from the
/// authenticated caller, never from a record.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Store a new record and return it as persisted.
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord>;

    /// Fetch a record that `owner_id` owns.
    ///
    /// A missing id and a foreign owner both yield [`GatewayError::NotFoundOrForbidden`].
    async fn get_owned(&self, id: &str, owner_id: &str) -> Result<FileRecord>;

    /// Newest-first page of the owner's records plus the owner's total count.
    async fn list_owned(&self, owner_id: &str, page: Page) -> Result<(Vec<FileRecord>, i64)>;

    /// Remove a record. Succeeds when it is already gone.
    async fn delete_owned(&self, id: &str, owner_id: &str) -> Result<()>;
}

/// [`MetadataStore`] backed by the sqlx pool.
#[derive(Debug, Clone)]
pub struct SqlFileStore {
    pool: DbPool,
}

impl SqlFileStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for SqlFileStore {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord> {
        let sql = format!(
            "INSERT INTO files (id, user_id, file_path, file_name, mime_type, file_size)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(&record.id)
            .bind(&record.owner_id)
            .bind(&record.object_key)
            .bind(&record.display_name)
            .bind(&record.mime_type)
            .bind(record.byte_size)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GatewayError::StoreWriteFailed(e.to_string()))
    }

    async fn get_owned(&self, id: &str, owner_id: &str) -> Result<FileRecord> {
        let sql = format!("SELECT {COLUMNS} FROM files WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| GatewayError::StoreReadFailed(e.to_string()))?
            .ok_or(GatewayError::NotFoundOrForbidden)
    }

    async fn list_owned(&self, owner_id: &str, page: Page) -> Result<(Vec<FileRecord>, i64)> {
        let read_err = |e: sqlx::Error| GatewayError::StoreReadFailed(e.to_string());

        // One transaction so the page and the total come from the same snapshot.
        let mut tx = self.pool.begin().await.map_err(read_err)?;

        let sql = format!(
            "SELECT {COLUMNS} FROM files
             WHERE user_id = $1
             ORDER BY created_at DESC, rowid DESC
             LIMIT $2 OFFSET $3"
        );
        let records = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(owner_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await
            .map_err(read_err)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE user_id = $1")
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(read_err)?;

        tx.commit().await.map_err(read_err)?;

        Ok((records, total))
    }

    async fn delete_owned(&self, id: &str, owner_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM files WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::StoreWriteFailed(e.to_string()))?;
        Ok(())
    }
}
