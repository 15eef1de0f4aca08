//! In-memory object store for tests and dry runs.

use std::collections::HashMap;

use tokio::sync::Mutex;

use newswire_shared::{NewswireError, Result};

use crate::ObjectStore;

/// Object storage held in a process-local map, keyed by (bucket, object).
/// Overwrite semantics match the real store: a second put of the same name
/// replaces the previous bytes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently held.
    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }
}

impl ObjectStore for MemoryStore {
    async fn put(&self, bucket: &str, object: &str, bytes: Vec<u8>) -> Result<()> {
        self.objects
            .lock()
            .await
            .insert((bucket.to_string(), object.to_string()), bytes);
        Ok(())
    }

    async fn get(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(&(bucket.to_string(), object.to_string()))
            .cloned()
            .ok_or_else(|| NewswireError::Staging(format!("object {bucket}/{object} not found")))
    }
}
