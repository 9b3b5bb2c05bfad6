//! Record store: where finished questionnaires are appended.
//!
//! The dialogue router only sees the [`RecordStore`] trait. Failures are
//! reported, never retried here.

pub mod sheets;
pub mod sqlite;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

pub use sheets::{ServiceAccountKey, SheetsConfig, SheetsRecordStore};
pub use sqlite::LibSqlRecordStore;

/// Append-only sink for submission rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Append one row. `values` is already ordered and complete, one per
    /// questionnaire step.
    async fn append_record(&self, values: &[String]) -> Result<(), StoreError>;
}

/// Keeps rows in memory, for tests.
#[derive(Default)]
pub struct MemoryRecordStore {
    rows: RwLock<Vec<Vec<String>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended rows.
    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append_record(&self, values: &[String]) -> Result<(), StoreError> {
        self.rows.write().await.push(values.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_keeps_rows_in_order() {
        let store = MemoryRecordStore::new();
        store
            .append_record(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        store.append_record(&["c".to_string()]).await.unwrap();

        let rows = store.rows().await;
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(store.name(), "memory");
    }
}
