//! Database schema and migrations for filegate.
//!
//! Migrations run in order on open; `schema_version` records which ones were applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: file metadata
    r#"
-- One row per upload initiation. The object in storage may not exist yet.
CREATE TABLE files (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    file_path   TEXT NOT NULL UNIQUE,   -- object key in the storage bucket
    file_name   TEXT NOT NULL,
    mime_type   TEXT,
    file_size   INTEGER,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX idx_files_user_created ON files(user_id, created_at DESC);
"#,
];
