//! In-memory document sink for tests.

use std::collections::HashMap;

use tokio::sync::Mutex;

use newswire_shared::{Result, ResultRecord};

use crate::DocumentSink;

/// Document sink held in a process-local map, keyed by (database,
/// collection). Inserts append, so repeated loads of the same records are
/// visible as duplicates, matching the real sink's semantics.
#[derive(Debug, Default)]
pub struct MemorySink {
    collections: Mutex<HashMap<(String, String), Vec<ResultRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in `database`.`collection`.
    pub async fn document_count(&self, database: &str, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(&(database.to_string(), collection.to_string()))
            .map_or(0, |documents| documents.len())
    }

    /// Snapshot of the documents in `database`.`collection`, in insert order.
    pub async fn documents(&self, database: &str, collection: &str) -> Vec<ResultRecord> {
        self.collections
            .lock()
            .await
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

impl DocumentSink for MemorySink {
    async fn bulk_insert(
        &self,
        database: &str,
        collection: &str,
        records: &[ResultRecord],
    ) -> Result<u64> {
        let mut collections = self.collections.lock().await;
        let documents = collections
            .entry((database.to_string(), collection.to_string()))
            .or_default();
        documents.extend(records.iter().cloned());
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ResultRecord {
        let mut map = ResultRecord::new();
        map.insert("id".into(), serde_json::Value::String(id.into()));
        map
    }

    #[tokio::test]
    async fn repeated_loads_append_duplicates() {
        let sink = MemorySink::new();
        let records = vec![record("a"), record("b")];

        sink.bulk_insert("news", "articles", &records)
            .await
            .expect("first insert succeeds");
        sink.bulk_insert("news", "articles", &records)
            .await
            .expect("second insert succeeds");

        assert_eq!(sink.document_count("news", "articles").await, 4);
    }

    #[tokio::test]
    async fn empty_insert_is_a_noop() {
        let sink = MemorySink::new();

        let inserted = sink
            .bulk_insert("news", "articles", &[])
            .await
            .expect("empty insert succeeds");

        assert_eq!(inserted, 0);
        assert_eq!(sink.document_count("news", "articles").await, 0);
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let sink = MemorySink::new();

        sink.bulk_insert("news", "articles", &[record("a")])
            .await
            .expect("insert succeeds");
        sink.bulk_insert("news", "archive", &[record("b"), record("c")])
            .await
            .expect("insert succeeds");

        assert_eq!(sink.document_count("news", "articles").await, 1);
        assert_eq!(sink.document_count("news", "archive").await, 2);
    }
}
