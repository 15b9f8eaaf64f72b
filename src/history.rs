//! Query history persistence.
//!
//! Records every answered question — the engine used, the generated SQL, and
//! how execution went — in a local SQLite state database, and serves the
//! authenticated history endpoint. Retention is bounded by entry count.

use crate::error::{Result, SageError};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const MAX_HISTORY_ENTRIES: i64 = 5000;

/// How a recorded question ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// Executed and returned rows.
    Success,
    /// Generation or execution failed.
    Error,
    /// The safety gate refused the generated statement.
    Rejected,
}

impl QueryStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Rejected => "rejected",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "error" => Self::Error,
            "rejected" => Self::Rejected,
            _ => Self::Success,
        }
    }
}

/// A stored history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub username: String,
    pub engine: String,
    pub question: String,
    pub sql: Option<String>,
    pub status: QueryStatus,
    pub execution_time_ms: Option<i64>,
    pub row_count: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: String,
}

/// Raw database row for a history entry.
#[derive(Debug, Clone, FromRow)]
struct HistoryEntryRow {
    id: i64,
    username: String,
    engine: String,
    question: String,
    sql: Option<String>,
    status: String,
    execution_time_ms: Option<i64>,
    row_count: Option<i64>,
    error_message: Option<String>,
    created_at: String,
}

impl From<HistoryEntryRow> for HistoryEntry {
    fn from(row: HistoryEntryRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            engine: row.engine,
            question: row.question,
            sql: row.sql,
            status: QueryStatus::from_str(&row.status),
            execution_time_ms: row.execution_time_ms,
            row_count: row.row_count,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

/// Fields recorded for a new entry.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub username: String,
    pub engine: String,
    pub question: String,
    pub sql: Option<String>,
    pub status: QueryStatus,
    pub execution_time_ms: Option<i64>,
    pub row_count: Option<i64>,
    pub error_message: Option<String>,
}

/// SQLite-backed query history store.
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Opens or creates the history database at the given path.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SageError::persistence(format!("Failed to create state directory: {e}"))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
            .map_err(|e| SageError::persistence(format!("Invalid database path: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| SageError::persistence(format!("Failed to open history database: {e}")))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Opens an in-memory store, for tests.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| SageError::persistence(format!("Failed to open in-memory store: {e}")))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Returns the default history database path for the current platform.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SageError::persistence("Could not determine config directory"))?;
        Ok(config_dir.join("db-sage").join("history.db"))
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS query_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                engine TEXT NOT NULL,
                question TEXT NOT NULL,
                sql TEXT,
                status TEXT NOT NULL,
                execution_time_ms INTEGER,
                row_count INTEGER,
                error_message TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SageError::persistence(format!("Failed to run migration: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_query_history_user ON query_history (username, id DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SageError::persistence(format!("Failed to create index: {e}")))?;

        Ok(())
    }

    /// Records a new entry and enforces retention.
    pub async fn record(&self, entry: NewHistoryEntry) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO query_history
            (username, engine, question, sql, status, execution_time_ms, row_count, error_message)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.username)
        .bind(&entry.engine)
        .bind(&entry.question)
        .bind(&entry.sql)
        .bind(entry.status.as_str())
        .bind(entry.execution_time_ms)
        .bind(entry.row_count)
        .bind(&entry.error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| SageError::persistence(format!("Failed to record query: {e}")))?;

        self.enforce_retention().await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns a user's most recent entries, newest first.
    pub async fn recent_for_user(&self, username: &str, limit: i64) -> Result<Vec<HistoryEntry>> {
        let rows: Vec<HistoryEntryRow> = sqlx::query_as(
            r#"
            SELECT id, username, engine, question, sql, status,
                   execution_time_ms, row_count, error_message, created_at
            FROM query_history
            WHERE username = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(username)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SageError::persistence(format!("Failed to load history: {e}")))?;

        Ok(rows.into_iter().map(HistoryEntry::from).collect())
    }

    /// Deletes the oldest entries beyond the retention cap.
    async fn enforce_retention(&self) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM query_history
            WHERE id NOT IN (
                SELECT id FROM query_history ORDER BY id DESC LIMIT ?
            )
            "#,
        )
        .bind(MAX_HISTORY_ENTRIES)
        .execute(&self.pool)
        .await
        .map_err(|e| SageError::persistence(format!("Failed to prune history: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(username: &str, status: QueryStatus) -> NewHistoryEntry {
        NewHistoryEntry {
            username: username.to_string(),
            engine: "pipeline".to_string(),
            question: "how many customers?".to_string(),
            sql: Some("SELECT COUNT(*) FROM customers LIMIT 100;".to_string()),
            status,
            execution_time_ms: Some(12),
            row_count: Some(1),
            error_message: None,
        }
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let store = HistoryStore::open_in_memory().await.unwrap();

        let id = store.record(entry("admin", QueryStatus::Success)).await.unwrap();
        assert!(id > 0);

        let entries = store.recent_for_user("admin", 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].engine, "pipeline");
        assert_eq!(entries[0].status, QueryStatus::Success);
        assert!(!entries[0].created_at.is_empty());
    }

    #[tokio::test]
    async fn test_history_is_per_user() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store.record(entry("alice", QueryStatus::Success)).await.unwrap();
        store.record(entry("bob", QueryStatus::Error)).await.unwrap();

        let alice = store.recent_for_user("alice", 10).await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].username, "alice");
    }

    #[tokio::test]
    async fn test_newest_first_and_limit() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        for i in 0..5 {
            let mut e = entry("admin", QueryStatus::Success);
            e.question = format!("question {i}");
            store.record(e).await.unwrap();
        }

        let entries = store.recent_for_user("admin", 3).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].question, "question 4");
    }

    #[tokio::test]
    async fn test_rejected_status_roundtrip() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        let mut e = entry("admin", QueryStatus::Rejected);
        e.sql = Some("DROP TABLE customers;".to_string());
        e.error_message = Some("statement contains forbidden keyword 'drop'".to_string());
        store.record(e).await.unwrap();

        let entries = store.recent_for_user("admin", 10).await.unwrap();
        assert_eq!(entries[0].status, QueryStatus::Rejected);
        assert!(entries[0].error_message.as_deref().unwrap().contains("drop"));
    }

    #[tokio::test]
    async fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("history.db");

        let store = HistoryStore::open(&path).await.unwrap();
        store.record(entry("admin", QueryStatus::Success)).await.unwrap();

        assert!(path.exists());
    }
}
