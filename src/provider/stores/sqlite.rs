use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use crate::provider::cache::PageKey;
use crate::provider::error::CacheError;
use crate::provider::store::{PageStore, StoredPage};

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: lookup by project for diagnostics
    &["CREATE INDEX IF NOT EXISTS idx_pages_project ON pages(provider, project_id)"],
];

/// Page store backed by a single SQLite database
pub struct SqlitePageStore {
    conn: Mutex<Connection>,
}

impl SqlitePageStore {
    pub fn new(db_path: &Path) -> Result<Self, CacheError> {
        info!("Initializing page cache database at {:?}", db_path);

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        Ok(store)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating page cache schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                provider TEXT NOT NULL,
                slug TEXT NOT NULL,
                project_id TEXT NOT NULL,
                page INTEGER NOT NULL,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (provider, slug, project_id, page)
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), CacheError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
        }

        Ok(())
    }

    #[cfg(test)]
    fn set_created_at(&self, key: &PageKey, created_at: DateTime<Utc>) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE pages SET created_at = ?1 WHERE provider = ?2 AND slug = ?3 AND project_id = ?4 AND page = ?5",
            (
                created_at.timestamp_millis(),
                key.provider.as_str(),
                key.safe_slug(),
                key.safe_project_id(),
                key.page as i64,
            ),
        )?;
        Ok(())
    }
}

impl PageStore for SqlitePageStore {
    fn load(&self, key: &PageKey) -> Result<Option<StoredPage>, CacheError> {
        let conn = self.lock_conn()?;
        let row: Option<(String, i64)> = conn
            .query_row(
                r#"
                SELECT body, created_at FROM pages
                WHERE provider = ?1 AND slug = ?2 AND project_id = ?3 AND page = ?4
                "#,
                (
                    key.provider.as_str(),
                    key.safe_slug(),
                    key.safe_project_id(),
                    key.page as i64,
                ),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((body, created_at)) = row else {
            return Ok(None);
        };

        Ok(Some(StoredPage {
            body: serde_json::from_str(&body)?,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
        }))
    }

    fn store(&self, key: &PageKey, body: &Value) -> Result<(), CacheError> {
        let body = serde_json::to_string(body)?;
        let now = Utc::now().timestamp_millis();

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO pages (provider, slug, project_id, page, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(provider, slug, project_id, page)
            DO UPDATE SET body = excluded.body, created_at = excluded.created_at
            "#,
            (
                key.provider.as_str(),
                key.safe_slug(),
                key.safe_project_id(),
                key.page as i64,
                body,
                now,
            ),
        )?;

        debug!("Stored page {}", key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM pages", [])?;
        info!("Cleared {} cached pages", removed);
        Ok(())
    }
}
