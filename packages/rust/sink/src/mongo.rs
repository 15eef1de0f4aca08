//! MongoDB adapter for the load stage.

use mongodb::Client;
use mongodb::bson::{self, Document};
use tracing::{debug, info};

use newswire_shared::{NewswireError, Result, ResultRecord};

use crate::DocumentSink;

/// Document sink backed by a MongoDB deployment.
///
/// The sink holds only the connection URI; every [`DocumentSink::bulk_insert`]
/// call opens a fresh client and shuts it down before returning, success or
/// not. Nothing is shared across calls.
pub struct MongoSink {
    uri: String,
}

impl MongoSink {
    /// Create a sink that will connect to `uri` on each insert.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Convert records to BSON documents, failing the whole batch on the first
/// record that cannot be represented.
fn to_documents(records: &[ResultRecord]) -> Result<Vec<Document>> {
    records
        .iter()
        .map(|record| {
            bson::to_document(record)
                .map_err(|e| NewswireError::Load(format!("record cannot convert to BSON: {e}")))
        })
        .collect()
}

impl DocumentSink for MongoSink {
    async fn bulk_insert(
        &self,
        database: &str,
        collection: &str,
        records: &[ResultRecord],
    ) -> Result<u64> {
        // The driver rejects empty bulk inserts, so short-circuit before
        // touching the network.
        if records.is_empty() {
            info!(database, collection, "no records to load");
            return Ok(0);
        }

        // Convert everything up front: a bad record fails the batch before
        // any connection is opened.
        let documents = to_documents(records)?;

        debug!(database, collection, records = documents.len(), "connecting");
        let client = Client::with_uri_str(&self.uri)
            .await
            .map_err(|e| NewswireError::Load(format!("failed to initialize client: {e}")))?;

        let result = client
            .database(database)
            .collection::<Document>(collection)
            .insert_many(&documents)
            .await;

        // Release the connection on both paths before reporting the outcome.
        client.shutdown().await;

        let inserted = result
            .map_err(|e| NewswireError::Load(format!("bulk insert failed: {e}")))?
            .inserted_ids
            .len() as u64;

        info!(database, collection, inserted, "bulk insert complete");
        Ok(inserted)
    }
}
