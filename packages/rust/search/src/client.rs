//! Search API client with an absorb-and-cooldown failure policy.
//!
//! A descriptor gets exactly one request. Any failure (non-2xx status,
//! transport error, malformed body, missing envelope path) is converted to
//! [`FetchOutcome::Failed`] after a cooldown wait; the client never returns
//! an error to the caller. The cooldown spaces out requests after a failure,
//! it does not retry the descriptor.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use newswire_shared::{NewswireError, Result, ResultRecord};

use crate::query::QueryDescriptor;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("newswire/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// SearchOptions
// ---------------------------------------------------------------------------

/// Client construction parameters.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Endpoint the client queries.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// How long to wait after a failed request before returning. Zero in
    /// tests.
    pub failure_cooldown: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            base_url: "https://api.nytimes.com/svc/search/v2/articlesearch.json".into(),
            timeout_secs: 30,
            failure_cooldown: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// FetchOutcome
// ---------------------------------------------------------------------------

/// Per-descriptor result of one fetch attempt.
///
/// `Failed` is a normal value, not an error: the aggregator maps it to an
/// empty contribution and the run continues. The records for that
/// keyword/page are silently lost, which is the intended policy.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx response with the expected envelope; the extracted record list.
    Success(Vec<ResultRecord>),
    /// Anything else. `reason` is for logs and reports only.
    Failed { reason: String },
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

// Both levels are optional on purpose: an envelope missing `response.docs`
// must be treated exactly like a failed request, not like an empty page.
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: Option<ResponseBody>,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    docs: Option<Vec<ResultRecord>>,
}

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// HTTP client for the article search endpoint.
pub struct SearchClient {
    options: SearchOptions,
    client: Client,
    base_url: Url,
}

impl SearchClient {
    /// Create a client from the given options.
    pub fn new(options: SearchOptions) -> Result<Self> {
        let base_url = Url::parse(&options.base_url).map_err(|e| {
            NewswireError::validation(format!(
                "invalid search base URL {:?}: {e}",
                options.base_url
            ))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| NewswireError::Search(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            options,
            client,
            base_url,
        })
    }

    /// Issue the single request for one descriptor.
    ///
    /// Never returns `Err`. On the failure path this logs a warning, sleeps
    /// the configured cooldown, and hands back [`FetchOutcome::Failed`] so
    /// the caller moves on to the next descriptor.
    pub async fn fetch(&self, descriptor: &QueryDescriptor) -> FetchOutcome {
        debug!(keyword = %descriptor.keyword, page = descriptor.page, "fetching page");

        match self.try_fetch(descriptor).await {
            Ok(records) => {
                debug!(
                    keyword = %descriptor.keyword,
                    page = descriptor.page,
                    records = records.len(),
                    "page fetched"
                );
                FetchOutcome::Success(records)
            }
            Err(reason) => {
                warn!(
                    keyword = %descriptor.keyword,
                    page = descriptor.page,
                    %reason,
                    cooldown_secs = self.options.failure_cooldown.as_secs(),
                    "fetch failed, cooling down and moving on"
                );
                tokio::time::sleep(self.options.failure_cooldown).await;
                FetchOutcome::Failed { reason }
            }
        }
    }

    async fn try_fetch(
        &self,
        descriptor: &QueryDescriptor,
    ) -> std::result::Result<Vec<ResultRecord>, String> {
        let query = [
            ("q", descriptor.keyword.clone()),
            ("begin_date", descriptor.date_range.begin_param()),
            ("end_date", descriptor.date_range.end_param()),
            ("page", descriptor.page.to_string()),
            ("api-key", descriptor.api_key.clone()),
        ];

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| format!("malformed response body: {e}"))?;

        envelope
            .response
            .and_then(|body| body.docs)
            .ok_or_else(|| "envelope missing response.docs".to_string())
    }
}
