//! Google Cloud Storage adapter speaking the JSON API over plain HTTP.
//!
//! Uploads use the media endpoint
//! (`POST /upload/storage/v1/b/{bucket}/o?uploadType=media&name={object}`),
//! downloads use `GET /storage/v1/b/{bucket}/o/{object}?alt=media`. The
//! endpoint is overridable so tests and emulators can stand in for the real
//! service.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use newswire_shared::{NewswireError, Result};

use crate::ObjectStore;

/// User-Agent string for storage requests.
const USER_AGENT: &str = concat!("newswire/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// GcsOptions
// ---------------------------------------------------------------------------

/// Connection settings for [`GcsStore`].
#[derive(Debug, Clone)]
pub struct GcsOptions {
    /// API endpoint; override for emulators and tests.
    pub endpoint: String,
    /// Project billed for requests; sent as `x-goog-user-project` when
    /// non-empty.
    pub project_id: String,
    /// OAuth bearer token, if the bucket requires one.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GcsOptions {
    fn default() -> Self {
        Self {
            endpoint: "https://storage.googleapis.com".into(),
            project_id: String::new(),
            token: None,
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// GcsStore
// ---------------------------------------------------------------------------

/// Object storage backed by the GCS JSON API.
pub struct GcsStore {
    options: GcsOptions,
    client: Client,
    endpoint: Url,
}

impl GcsStore {
    /// Create a store from the given options.
    pub fn new(options: GcsOptions) -> Result<Self> {
        let endpoint = Url::parse(&options.endpoint).map_err(|e| {
            NewswireError::validation(format!(
                "invalid storage endpoint {:?}: {e}",
                options.endpoint
            ))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| NewswireError::Staging(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            options,
            client,
            endpoint,
        })
    }

    fn upload_url(&self, bucket: &str, object: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| NewswireError::Staging("storage endpoint cannot be a base URL".into()))?
            .extend(["upload", "storage", "v1", "b", bucket, "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", object);
        Ok(url)
    }

    fn download_url(&self, bucket: &str, object: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| NewswireError::Staging("storage endpoint cannot be a base URL".into()))?
            .extend(["storage", "v1", "b", bucket, "o", object]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut request = request;
        if let Some(token) = &self.options.token {
            request = request.bearer_auth(token);
        }
        if !self.options.project_id.is_empty() {
            request = request.header("x-goog-user-project", &self.options.project_id);
        }
        request
    }
}

impl ObjectStore for GcsStore {
    async fn put(&self, bucket: &str, object: &str, bytes: Vec<u8>) -> Result<()> {
        let url = self.upload_url(bucket, object)?;
        debug!(bucket, object, bytes = bytes.len(), "uploading staged object");

        let response = self
            .apply_auth(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                NewswireError::Staging(format!("upload of {bucket}/{object} failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewswireError::Staging(format!(
                "upload of {bucket}/{object} rejected: HTTP {status}"
            )));
        }

        Ok(())
    }

    async fn get(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
        let url = self.download_url(bucket, object)?;
        debug!(bucket, object, "downloading staged object");

        let response = self
            .apply_auth(self.client.get(url))
            .send()
            .await
            .map_err(|e| {
                NewswireError::Staging(format!("download of {bucket}/{object} failed: {e}"))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(NewswireError::Staging(format!(
                "object {bucket}/{object} not found"
            )));
        }
        if !status.is_success() {
            return Err(NewswireError::Staging(format!(
                "download of {bucket}/{object} rejected: HTTP {status}"
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            NewswireError::Staging(format!("download of {bucket}/{object} failed: {e}"))
        })?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(endpoint: String) -> GcsStore {
        GcsStore::new(GcsOptions {
            endpoint,
            project_id: "test-project".into(),
            token: Some("test-token".into()),
            timeout_secs: 5,
        })
        .expect("store builds")
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        let result = GcsStore::new(GcsOptions {
            endpoint: "not a url".into(),
            ..GcsOptions::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn object_names_are_percent_encoded_in_download_path() {
        let store = test_store("https://storage.googleapis.com".into());
        let url = store
            .download_url("news-staging", "runs/articles.json")
            .expect("url builds");

        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/news-staging/o/runs%2Farticles.json?alt=media"
        );
    }

    #[tokio::test]
    async fn put_uploads_via_media_endpoint_with_auth() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path(
                "/upload/storage/v1/b/news-staging/o",
            ))
            .and(wiremock::matchers::query_param("uploadType", "media"))
            .and(wiremock::matchers::query_param("name", "articles.json"))
            .and(wiremock::matchers::header(
                "authorization",
                "Bearer test-token",
            ))
            .and(wiremock::matchers::header(
                "x-goog-user-project",
                "test-project",
            ))
            .and(wiremock::matchers::body_string("[\n  1\n]"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"name": "articles.json", "bucket": "news-staging"}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let store = test_store(server.uri());
        store
            .put("news-staging", "articles.json", b"[\n  1\n]".to_vec())
            .await
            .expect("upload succeeds");
    }

    #[tokio::test]
    async fn get_downloads_object_media() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(
                "/storage/v1/b/news-staging/o/articles.json",
            ))
            .and(wiremock::matchers::query_param("alt", "media"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let store = test_store(server.uri());
        let bytes = store
            .get("news-staging", "articles.json")
            .await
            .expect("download succeeds");

        assert_eq!(bytes, b"[]");
    }

    #[tokio::test]
    async fn missing_object_reports_not_found() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = test_store(server.uri());
        let err = store
            .get("news-staging", "articles.json")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn rejected_upload_is_an_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = test_store(server.uri());
        let err = store
            .put("news-staging", "articles.json", b"[]".to_vec())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("HTTP 403"));
    }
}
