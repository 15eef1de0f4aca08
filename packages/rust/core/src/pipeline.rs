//! The two pipeline stages: fetch-and-stage and load.
//!
//! Stage one harvests the search API and overwrites the staged object;
//! stage two reads the staged object back and bulk-inserts its records.
//! The caller (normally the scheduler behind the CLI) runs stage two only
//! after stage one succeeded. No state is shared between invocations:
//! staging is idempotent (overwrite), loading is not (append).

use std::time::{Duration, Instant};

use tracing::{info, instrument};

use newswire_search::{
    FetchOutcome, HarvestObserver, QueryDescriptor, QueryPlan, SearchClient, SearchOptions,
    harvest,
};
use newswire_shared::{DateRange, NewswireError, Result, RunId};
use newswire_sink::DocumentSink;
use newswire_staging::{ObjectStore, read_batch, write_batch};

// ---------------------------------------------------------------------------
// Stage configuration
// ---------------------------------------------------------------------------

/// Configuration for the fetch-and-stage stage.
#[derive(Debug, Clone)]
pub struct FetchStageConfig {
    /// Keywords to harvest, in order.
    pub keywords: Vec<String>,
    /// Pages fetched per keyword.
    pub page_count: u32,
    /// Date window applied to every query.
    pub date_range: DateRange,
    /// Search API key, resolved by the caller.
    pub api_key: String,
    /// Staging bucket.
    pub bucket: String,
    /// Staged object name; overwritten on each run.
    pub object_name: String,
    /// Fetcher options (endpoint, timeout, cooldown).
    pub search: SearchOptions,
}

impl FetchStageConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(NewswireError::validation("search API key is empty"));
        }
        if self.bucket.is_empty() {
            return Err(NewswireError::validation("staging bucket is empty"));
        }
        if self.object_name.is_empty() {
            return Err(NewswireError::validation("staged object name is empty"));
        }
        Ok(())
    }
}

/// Configuration for the load stage.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Bucket holding the staged object.
    pub bucket: String,
    /// Staged object name to read back.
    pub object_name: String,
    /// Target database name.
    pub database: String,
    /// Target collection name.
    pub collection: String,
}

impl LoadConfig {
    fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(NewswireError::validation("staging bucket is empty"));
        }
        if self.object_name.is_empty() {
            return Err(NewswireError::validation("staged object name is empty"));
        }
        if self.database.is_empty() {
            return Err(NewswireError::validation("load database is empty"));
        }
        if self.collection.is_empty() {
            return Err(NewswireError::validation("load collection is empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stage reports
// ---------------------------------------------------------------------------

/// Result of one fetch-and-stage run.
#[derive(Debug)]
pub struct FetchStageReport {
    /// Identifier of this run.
    pub run_id: RunId,
    /// Descriptors the plan produced.
    pub descriptors_total: usize,
    /// Descriptors whose single fetch attempt failed.
    pub descriptors_failed: usize,
    /// Records in the staged batch.
    pub records_staged: usize,
    /// Size of the staged object in bytes.
    pub staged_bytes: u64,
    /// Failed descriptors (label, reason) for reporting.
    pub failures: Vec<(String, String)>,
    /// Total duration of the stage.
    pub elapsed: Duration,
}

/// Result of one load run.
#[derive(Debug)]
pub struct LoadReport {
    /// Identifier of this run.
    pub run_id: RunId,
    /// Documents inserted into the collection.
    pub records_loaded: u64,
    /// Total duration of the stage.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting stage status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a descriptor's fetch completes during harvest.
    fn descriptor_fetched(
        &self,
        keyword: &str,
        page: u32,
        failed: bool,
        current: usize,
        total: usize,
    );
    /// Called when a stage completes.
    fn done(&self, summary: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn descriptor_fetched(
        &self,
        _keyword: &str,
        _page: u32,
        _failed: bool,
        _current: usize,
        _total: usize,
    ) {
    }
    fn done(&self, _summary: &str) {}
}

/// Adapts a `ProgressReporter` to the harvest observer interface.
struct PipelineHarvestObserver<'a> {
    inner: &'a dyn ProgressReporter,
}

impl HarvestObserver for PipelineHarvestObserver<'_> {
    fn descriptor_fetched(
        &self,
        descriptor: &QueryDescriptor,
        outcome: &FetchOutcome,
        current: usize,
        total: usize,
    ) {
        self.inner.descriptor_fetched(
            &descriptor.keyword,
            descriptor.page,
            outcome.is_failed(),
            current,
            total,
        );
    }
}

// ---------------------------------------------------------------------------
// fetch_and_stage
// ---------------------------------------------------------------------------

/// Run the fetch-and-stage stage.
///
/// 1. Enumerate keyword × page descriptors
/// 2. Fetch each one sequentially (failures absorbed per descriptor)
/// 3. Aggregate records in enumeration order
/// 4. Overwrite the staged object with the batch
///
/// Only validation and staging failures are fatal; fetch failures shrink
/// the batch and are listed in the report.
#[instrument(skip_all, fields(bucket = %config.bucket, object = %config.object_name))]
pub async fn fetch_and_stage<S: ObjectStore>(
    config: &FetchStageConfig,
    store: &S,
    progress: &dyn ProgressReporter,
) -> Result<FetchStageReport> {
    let start = Instant::now();
    let run_id = RunId::new();

    config.validate()?;

    info!(
        %run_id,
        keywords = config.keywords.len(),
        pages = config.page_count,
        date_range = %config.date_range,
        "starting fetch-and-stage run"
    );

    progress.phase("Harvesting search results");
    let client = SearchClient::new(config.search.clone())?;
    let plan = QueryPlan::new(
        config.keywords.clone(),
        config.page_count,
        config.date_range,
        config.api_key.clone(),
    );

    let observer = PipelineHarvestObserver { inner: progress };
    let (harvest_report, batch) = harvest(&client, &plan, &observer).await;

    progress.phase("Staging aggregated batch");
    let staged_bytes = write_batch(store, &config.bucket, &config.object_name, &batch).await?;

    let report = FetchStageReport {
        run_id,
        descriptors_total: harvest_report.descriptors_total,
        descriptors_failed: harvest_report.descriptors_failed,
        records_staged: batch.len(),
        staged_bytes,
        failures: harvest_report.failures,
        elapsed: start.elapsed(),
    };

    progress.done(&format!(
        "staged {} records ({} of {} queries failed)",
        report.records_staged, report.descriptors_failed, report.descriptors_total
    ));

    info!(
        run_id = %report.run_id,
        records = report.records_staged,
        failed = report.descriptors_failed,
        bytes = report.staged_bytes,
        elapsed_ms = report.elapsed.as_millis(),
        "fetch-and-stage complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// load
// ---------------------------------------------------------------------------

/// Run the load stage.
///
/// Reads the staged object back and bulk-inserts its records into the
/// target collection. A read failure aborts before any database work
/// starts. Loading appends: rerunning against the same staged object
/// inserts duplicate documents.
#[instrument(
    skip_all,
    fields(
        bucket = %config.bucket,
        object = %config.object_name,
        database = %config.database,
        collection = %config.collection,
    )
)]
pub async fn load<S: ObjectStore, D: DocumentSink>(
    config: &LoadConfig,
    store: &S,
    sink: &D,
    progress: &dyn ProgressReporter,
) -> Result<LoadReport> {
    let start = Instant::now();
    let run_id = RunId::new();

    config.validate()?;

    info!(%run_id, "starting load run");

    progress.phase("Reading staged batch");
    let records = read_batch(store, &config.bucket, &config.object_name).await?;

    progress.phase("Loading into collection");
    let records_loaded = sink
        .bulk_insert(&config.database, &config.collection, &records)
        .await?;

    let report = LoadReport {
        run_id,
        records_loaded,
        elapsed: start.elapsed(),
    };

    progress.done(&format!("loaded {} documents", report.records_loaded));

    info!(
        run_id = %report.run_id,
        records = report.records_loaded,
        elapsed_ms = report.elapsed.as_millis(),
        "load complete"
    );

    Ok(report)
}
