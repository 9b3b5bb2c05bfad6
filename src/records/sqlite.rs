//! libSQL record store: local fallback when no spreadsheet is configured.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;

use super::RecordStore;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS submissions (
        id TEXT PRIMARY KEY,
        submitted_at TEXT NOT NULL,
        answers TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_submissions_submitted_at ON submissions(submitted_at);
"#;

/// Writes one row per submission into a `submissions` table.
///
/// Answers are kept as a JSON object keyed by column header, so the table
/// does not change when the questionnaire does.
pub struct LibSqlRecordStore {
    // Held so an in-memory database outlives its connection.
    _db: Database,
    conn: Connection,
    columns: Vec<&'static str>,
}

impl LibSqlRecordStore {
    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path, columns: Vec<&'static str>) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Connectivity(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connectivity(format!("Failed to open libSQL database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connectivity(format!("Failed to create connection: {e}")))?;

        let store = Self {
            _db: db,
            conn,
            columns,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Record database opened");
        Ok(store)
    }

    /// In-memory database (for tests).
    pub async fn new_memory(columns: Vec<&'static str>) -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StoreError::Connectivity(format!("Failed to create in-memory database: {e}"))
            })?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connectivity(format!("Failed to create connection: {e}")))?;

        let store = Self {
            _db: db,
            conn,
            columns,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(SCHEMA)
            .await
            .map_err(|e| StoreError::Query(format!("init_schema: {e}")))?;
        Ok(())
    }

    /// Number of stored submissions.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM submissions", ())
            .await
            .map_err(|e| StoreError::Query(format!("count: {e}")))?;
        match rows.next().await {
            Ok(Some(row)) => {
                let n: i64 = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("count row: {e}")))?;
                Ok(n as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(StoreError::Query(format!("count: {e}"))),
        }
    }

    /// Most recent submissions first, as value rows in column order.
    /// A column missing from a stored row reads as an empty string.
    pub async fn recent(&self, limit: usize) -> Result<Vec<Vec<String>>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT answers FROM submissions ORDER BY submitted_at DESC, rowid DESC LIMIT ?1",
                params![limit as i64],
            )
            .await
            .map_err(|e| StoreError::Query(format!("recent: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("recent: {e}")))?
        {
            let raw: String = row
                .get(0)
                .map_err(|e| StoreError::Query(format!("recent row: {e}")))?;
            let answers: Map<String, Value> = serde_json::from_str(&raw)
                .map_err(|e| StoreError::Serialization(format!("recent row: {e}")))?;
            let values = self
                .columns
                .iter()
                .map(|column| {
                    answers
                        .get(*column)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                })
                .collect();
            out.push(values);
        }
        Ok(out)
    }
}

#[async_trait]
impl RecordStore for LibSqlRecordStore {
    fn name(&self) -> &str {
        "libsql"
    }

    async fn append_record(&self, values: &[String]) -> Result<(), StoreError> {
        if values.len() != self.columns.len() {
            return Err(StoreError::Rejected(format!(
                "expected {} values, got {}",
                self.columns.len(),
                values.len()
            )));
        }

        let answers: Map<String, Value> = self
            .columns
            .iter()
            .zip(values)
            .map(|(column, value)| (column.to_string(), Value::String(value.clone())))
            .collect();
        let answers = serde_json::to_string(&answers)
            .map_err(|e| StoreError::Serialization(format!("append_record: {e}")))?;

        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO submissions (id, submitted_at, answers) VALUES (?1, ?2, ?3)",
                params![id.clone(), Utc::now().to_rfc3339(), answers],
            )
            .await
            .map_err(|e| StoreError::Query(format!("append_record: {e}")))?;

        debug!(submission_id = %id, "Submission stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: [&str; 7] = ["Name", "Location", "Date", "Concern", "Format", "Prior", "Ready"];

    fn columns() -> Vec<&'static str> {
        COLUMNS.to_vec()
    }

    fn row(prefix: &str) -> Vec<String> {
        (0..7).map(|i| format!("{prefix}{i}")).collect()
    }

    #[tokio::test]
    async fn append_and_read_back() {
        let store = LibSqlRecordStore::new_memory(columns()).await.unwrap();
        store.append_record(&row("a")).await.unwrap();
        store.append_record(&row("b")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.contains(&row("a")));
        assert!(recent.contains(&row("b")));
    }

    #[tokio::test]
    async fn empty_values_are_stored_not_dropped() {
        let store = LibSqlRecordStore::new_memory(columns()).await.unwrap();
        let mut values = row("x");
        values[3] = String::new();
        store.append_record(&values).await.unwrap();

        let recent = store.recent(1).await.unwrap();
        assert_eq!(recent[0].len(), 7);
        assert_eq!(recent[0][3], "");
    }

    #[tokio::test]
    async fn wrong_width_is_rejected() {
        let store = LibSqlRecordStore::new_memory(columns()).await.unwrap();
        let err = store
            .append_record(&["only".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn answers_are_keyed_by_column() {
        let store = LibSqlRecordStore::new_memory(columns()).await.unwrap();
        store.append_record(&row("k")).await.unwrap();

        let mut rows = store
            .conn
            .query("SELECT answers FROM submissions", ())
            .await
            .unwrap();
        let raw: String = rows.next().await.unwrap().unwrap().get(0).unwrap();
        let answers: Map<String, Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(answers["Name"], "k0");
        assert_eq!(answers["Ready"], "k6");
    }

    #[tokio::test]
    async fn corrupt_row_is_reported() {
        let store = LibSqlRecordStore::new_memory(columns()).await.unwrap();
        store
            .conn
            .execute(
                "INSERT INTO submissions (id, submitted_at, answers) VALUES ('x', 'now', 'not json')",
                (),
            )
            .await
            .unwrap();
        assert!(matches!(
            store.recent(5).await.unwrap_err(),
            StoreError::Serialization(_)
        ));
    }

    #[tokio::test]
    async fn local_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("intake.db");
        let store = LibSqlRecordStore::new_local(&path, columns()).await.unwrap();
        store.append_record(&row("f")).await.unwrap();
        assert!(path.exists());
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
