//! Object-storage staging layer.
//!
//! The staged object is the only durable handoff point between the two
//! pipeline stages: the fetch stage overwrites it, the load stage reads it
//! back. This crate provides:
//! - [`ObjectStore`] — the storage capability the pipeline is written against
//! - [`write_batch`] / [`read_batch`] — the serialization boundary
//! - [`GcsStore`] — Google Cloud Storage JSON-API adapter
//! - [`MemoryStore`] — in-process adapter for tests and dry runs

pub mod gcs;
pub mod memory;

use std::future::Future;

use tracing::info;

use newswire_shared::{AggregatedBatch, NewswireError, Result, ResultRecord};

pub use gcs::{GcsOptions, GcsStore};
pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// ObjectStore capability
// ---------------------------------------------------------------------------

/// Durable object storage, addressed by bucket and object name.
///
/// Both operations are single calls with no retry; any failure is fatal for
/// the invoking pipeline stage.
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` as `object` in `bucket`, overwriting any existing
    /// object of that name. The object is fully durable before this returns.
    fn put(
        &self,
        bucket: &str,
        object: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Read the full contents of `object` in `bucket`.
    fn get(&self, bucket: &str, object: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

// ---------------------------------------------------------------------------
// Serialization boundary
// ---------------------------------------------------------------------------

/// Serialize a batch as a pretty-printed JSON array and overwrite the
/// staged object with it. Returns the number of bytes written.
///
/// Each record keeps its field order as received. An empty batch stages
/// `[]` rather than skipping the write.
pub async fn write_batch<S: ObjectStore>(
    store: &S,
    bucket: &str,
    object: &str,
    batch: &AggregatedBatch,
) -> Result<u64> {
    let bytes = serde_json::to_vec_pretty(&batch.records)
        .map_err(|e| NewswireError::Staging(format!("failed to serialize batch: {e}")))?;
    let len = bytes.len() as u64;

    store.put(bucket, object, bytes).await?;

    info!(
        bucket,
        object,
        records = batch.len(),
        bytes = len,
        "batch staged"
    );
    Ok(len)
}

/// Read the staged object back and parse it as a JSON array of records,
/// preserving staged order.
pub async fn read_batch<S: ObjectStore>(
    store: &S,
    bucket: &str,
    object: &str,
) -> Result<Vec<ResultRecord>> {
    let bytes = store.get(bucket, object).await?;

    let records: Vec<ResultRecord> = serde_json::from_slice(&bytes).map_err(|e| {
        NewswireError::Staging(format!("staged object is not a JSON record array: {e}"))
    })?;

    info!(bucket, object, records = records.len(), "staged batch read");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ResultRecord {
        let mut map = ResultRecord::new();
        map.insert("id".into(), serde_json::Value::String(id.into()));
        map.insert("section".into(), serde_json::Value::String("news".into()));
        map
    }

    #[tokio::test]
    async fn staged_batch_round_trips_records_and_order() {
        let store = MemoryStore::new();
        let batch = AggregatedBatch::from(vec![record("one"), record("two"), record("three")]);

        write_batch(&store, "news-staging", "articles.json", &batch)
            .await
            .expect("write succeeds");
        let read = read_batch(&store, "news-staging", "articles.json")
            .await
            .expect("read succeeds");

        assert_eq!(read, batch.records);
    }

    #[tokio::test]
    async fn restaging_overwrites_instead_of_appending() {
        let store = MemoryStore::new();
        let first = AggregatedBatch::from(vec![record("old-1"), record("old-2")]);
        let second = AggregatedBatch::from(vec![record("new-1")]);

        write_batch(&store, "news-staging", "articles.json", &first)
            .await
            .expect("first write succeeds");
        write_batch(&store, "news-staging", "articles.json", &second)
            .await
            .expect("second write succeeds");

        let read = read_batch(&store, "news-staging", "articles.json")
            .await
            .expect("read succeeds");

        // One object, latest content only.
        assert_eq!(store.object_count().await, 1);
        assert_eq!(read, second.records);
    }

    #[tokio::test]
    async fn empty_batch_stages_an_empty_array() {
        let store = MemoryStore::new();

        let written = write_batch(&store, "news-staging", "articles.json", &AggregatedBatch::new())
            .await
            .expect("write succeeds");
        assert!(written > 0);

        let raw = store
            .get("news-staging", "articles.json")
            .await
            .expect("object exists");
        assert_eq!(raw, b"[]");

        let read = read_batch(&store, "news-staging", "articles.json")
            .await
            .expect("read succeeds");
        assert!(read.is_empty());
    }

    #[tokio::test]
    async fn staged_payload_is_a_pretty_printed_array() {
        let store = MemoryStore::new();
        let batch = AggregatedBatch::from(vec![record("one")]);

        write_batch(&store, "news-staging", "articles.json", &batch)
            .await
            .expect("write succeeds");

        let raw = store
            .get("news-staging", "articles.json")
            .await
            .expect("object exists");
        let text = String::from_utf8(raw).expect("utf-8 payload");

        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"id\": \"one\""));
    }

    #[tokio::test]
    async fn reading_a_missing_object_is_fatal() {
        let store = MemoryStore::new();

        let err = read_batch(&store, "news-staging", "nope.json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn malformed_staged_object_is_fatal() {
        let store = MemoryStore::new();
        store
            .put("news-staging", "articles.json", b"{not an array".to_vec())
            .await
            .expect("raw put succeeds");

        let err = read_batch(&store, "news-staging", "articles.json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a JSON record array"));
    }
}
