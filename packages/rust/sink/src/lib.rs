//! Document-database load layer.
//!
//! This crate provides:
//! - [`DocumentSink`] — the bulk-insert capability the load stage is
//!   written against
//! - [`MongoSink`] — MongoDB adapter, one connection per call, released on
//!   both success and failure paths
//! - [`MemorySink`] — in-process adapter for tests

pub mod memory;
pub mod mongo;

use std::future::Future;

use newswire_shared::{Result, ResultRecord};

pub use memory::MemorySink;
pub use mongo::MongoSink;

/// Bulk document insertion, addressed by database and collection name.
///
/// One call performs exactly one bulk operation: no deduplication, no
/// upsert, so loading the same records twice stores them twice. A failure
/// is fatal for the whole batch; whatever partial-commit behavior the
/// backing store has is inherited as-is.
pub trait DocumentSink: Send + Sync {
    /// Insert every record into `database`.`collection` as one bulk
    /// operation and return the number of documents inserted. An empty
    /// input is a valid no-op returning 0.
    fn bulk_insert(
        &self,
        database: &str,
        collection: &str,
        records: &[ResultRecord],
    ) -> impl Future<Output = Result<u64>> + Send;
}
