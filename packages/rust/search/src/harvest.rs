//! Sequential harvest: fetch every descriptor in enumeration order and
//! aggregate the results into one batch.

use std::time::{Duration, Instant};

use tracing::{info, instrument};

use newswire_shared::{AggregatedBatch, ResultRecord};

use crate::client::{FetchOutcome, SearchClient};
use crate::query::{QueryDescriptor, QueryPlan};

// ---------------------------------------------------------------------------
// HarvestReport
// ---------------------------------------------------------------------------

/// Summary of a completed harvest.
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Number of descriptors the plan produced.
    pub descriptors_total: usize,
    /// Descriptors whose single fetch attempt failed.
    pub descriptors_failed: usize,
    /// Records aggregated across all successful descriptors.
    pub records_fetched: usize,
    /// Failed descriptors (label, reason) for reporting.
    pub failures: Vec<(String, String)>,
    /// Total duration of the harvest.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Progress observation
// ---------------------------------------------------------------------------

/// Per-descriptor progress hook for callers that render progress.
pub trait HarvestObserver: Send + Sync {
    /// Called after each descriptor's fetch completes, success or failure.
    fn descriptor_fetched(
        &self,
        descriptor: &QueryDescriptor,
        outcome: &FetchOutcome,
        current: usize,
        total: usize,
    );
}

/// No-op observer for headless/test usage.
pub struct SilentHarvest;

impl HarvestObserver for SilentHarvest {
    fn descriptor_fetched(
        &self,
        _descriptor: &QueryDescriptor,
        _outcome: &FetchOutcome,
        _current: usize,
        _total: usize,
    ) {
    }
}

// ---------------------------------------------------------------------------
// harvest
// ---------------------------------------------------------------------------

/// Fold the plan's descriptors into one ordered batch.
///
/// Strictly sequential: one fetch at a time, in enumeration order; the
/// batch inherits (keyword, page, within-page) ordering from the plan and
/// the API. Failed descriptors contribute nothing and the fold continues,
/// so this function itself cannot fail.
#[instrument(skip_all, fields(descriptors = plan.len()))]
pub async fn harvest(
    client: &SearchClient,
    plan: &QueryPlan,
    observer: &dyn HarvestObserver,
) -> (HarvestReport, AggregatedBatch) {
    let start = Instant::now();
    let total = plan.len();

    info!(descriptors = total, "starting harvest");

    let mut records: Vec<ResultRecord> = Vec::new();
    let mut failures: Vec<(String, String)> = Vec::new();

    for (i, descriptor) in plan.descriptors().enumerate() {
        let outcome = client.fetch(&descriptor).await;
        observer.descriptor_fetched(&descriptor, &outcome, i + 1, total);

        match outcome {
            FetchOutcome::Success(page_records) => records.extend(page_records),
            FetchOutcome::Failed { reason } => {
                let label = format!("{} page {}", descriptor.keyword, descriptor.page);
                failures.push((label, reason));
            }
        }
    }

    let report = HarvestReport {
        descriptors_total: total,
        descriptors_failed: failures.len(),
        records_fetched: records.len(),
        failures,
        elapsed: start.elapsed(),
    };

    info!(
        descriptors = report.descriptors_total,
        failed = report.descriptors_failed,
        records = report.records_fetched,
        elapsed_ms = report.elapsed.as_millis(),
        "harvest complete"
    );

    (report, AggregatedBatch::from(records))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::client::SearchOptions;
    use newswire_shared::DateRange;

    fn test_client(base_url: String) -> SearchClient {
        SearchClient::new(SearchOptions {
            base_url,
            timeout_secs: 5,
            failure_cooldown: Duration::ZERO,
        })
        .expect("client builds")
    }

    fn test_plan(keywords: &[&str], page_count: u32) -> QueryPlan {
        let range = DateRange::parse("20200101", "20241231").expect("valid test range");
        QueryPlan::new(
            keywords.iter().map(|k| k.to_string()).collect(),
            page_count,
            range,
            "test-key".into(),
        )
    }

    fn docs_body(ids: &[&str]) -> serde_json::Value {
        let docs: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({"id": id}))
            .collect();
        serde_json::json!({"response": {"docs": docs}})
    }

    async fn mount_page(
        server: &wiremock::MockServer,
        keyword: &str,
        page: u32,
        response: wiremock::ResponseTemplate,
    ) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::query_param("q", keyword))
            .and(wiremock::matchers::query_param("page", page.to_string()))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn batch_preserves_keyword_then_page_then_response_order() {
        let server = wiremock::MockServer::start().await;

        mount_page(
            &server,
            "Alpha",
            0,
            wiremock::ResponseTemplate::new(200).set_body_json(docs_body(&["a0-1", "a0-2"])),
        )
        .await;
        mount_page(
            &server,
            "Alpha",
            1,
            wiremock::ResponseTemplate::new(200).set_body_json(docs_body(&["a1-1"])),
        )
        .await;
        mount_page(
            &server,
            "Beta",
            0,
            wiremock::ResponseTemplate::new(200).set_body_json(docs_body(&["b0-1"])),
        )
        .await;
        mount_page(
            &server,
            "Beta",
            1,
            wiremock::ResponseTemplate::new(200).set_body_json(docs_body(&["b1-1"])),
        )
        .await;

        let client = test_client(server.uri());
        let plan = test_plan(&["Alpha", "Beta"], 2);
        let (report, batch) = harvest(&client, &plan, &SilentHarvest).await;

        assert_eq!(report.descriptors_total, 4);
        assert_eq!(report.descriptors_failed, 0);
        assert_eq!(report.records_fetched, 5);

        let ids: Vec<&str> = batch
            .records
            .iter()
            .map(|r| r["id"].as_str().expect("string id"))
            .collect();
        assert_eq!(ids, vec!["a0-1", "a0-2", "a1-1", "b0-1", "b1-1"]);
    }

    #[tokio::test]
    async fn failed_descriptor_contributes_nothing_and_run_continues() {
        let server = wiremock::MockServer::start().await;

        mount_page(
            &server,
            "Election",
            0,
            wiremock::ResponseTemplate::new(200).set_body_json(docs_body(&["e0"])),
        )
        .await;
        mount_page(
            &server,
            "Election",
            1,
            wiremock::ResponseTemplate::new(200).set_body_json(docs_body(&["e1"])),
        )
        .await;
        mount_page(
            &server,
            "Stock",
            0,
            wiremock::ResponseTemplate::new(200).set_body_json(docs_body(&["s0"])),
        )
        .await;
        mount_page(&server, "Stock", 1, wiremock::ResponseTemplate::new(500)).await;

        let client = test_client(server.uri());
        let plan = test_plan(&["Election", "Stock"], 2);
        let (report, batch) = harvest(&client, &plan, &SilentHarvest).await;

        // Three descriptors contribute; the failed one is absorbed.
        assert_eq!(report.descriptors_total, 4);
        assert_eq!(report.descriptors_failed, 1);
        assert_eq!(batch.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "Stock page 1");
        assert!(report.failures[0].1.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn empty_plan_harvests_nothing() {
        let server = wiremock::MockServer::start().await;

        let client = test_client(server.uri());
        let plan = test_plan(&[], 50);
        let (report, batch) = harvest(&client, &plan, &SilentHarvest).await;

        assert_eq!(report.descriptors_total, 0);
        assert!(batch.is_empty());
    }

    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl HarvestObserver for CountingObserver {
        fn descriptor_fetched(
            &self,
            _descriptor: &QueryDescriptor,
            _outcome: &FetchOutcome,
            _current: usize,
            _total: usize,
        ) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn observer_sees_every_descriptor() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_json(docs_body(&["x"])),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let plan = test_plan(&["Election", "Stock", "Covid"], 2);
        let observer = CountingObserver {
            calls: AtomicUsize::new(0),
        };

        let (report, _batch) = harvest(&client, &plan, &observer).await;

        assert_eq!(report.descriptors_total, 6);
        assert_eq!(observer.calls.load(Ordering::SeqCst), 6);
    }
}
