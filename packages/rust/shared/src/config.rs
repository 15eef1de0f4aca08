//! Application configuration for newswire.
//!
//! User config lives at `~/.newswire/newswire.toml`.
//! CLI flags override config file values, which override defaults; the
//! defaults are the original pipeline's operating values.
//!
//! Credentials are never stored in the file — each section names the
//! environment variable that holds the secret at run time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NewswireError, Result};
use crate::types::DateRange;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newswire.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newswire";

// ---------------------------------------------------------------------------
// Config structs (matching newswire.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search API query settings.
    #[serde(default)]
    pub search: SearchSection,

    /// Object-storage staging destination.
    #[serde(default)]
    pub staging: StagingSection,

    /// Document-database load destination.
    #[serde(default)]
    pub load: LoadSection,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    /// Search endpoint to query.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Keywords to harvest, in order.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Pages fetched per keyword (0-based pages `0..page_count`).
    #[serde(default = "default_page_count")]
    pub page_count: u32,

    /// Inclusive window start, `YYYYMMDD`.
    #[serde(default = "default_start_date")]
    pub start_date: String,

    /// Inclusive window end, `YYYYMMDD`.
    #[serde(default = "default_end_date")]
    pub end_date: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Wait after a failed request before moving on, in seconds.
    /// A cooldown, not a retry — the descriptor is not attempted again.
    #[serde(default = "default_cooldown_secs")]
    pub failure_cooldown_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            keywords: default_keywords(),
            page_count: default_page_count(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            timeout_secs: default_timeout_secs(),
            failure_cooldown_secs: default_cooldown_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.nytimes.com/svc/search/v2/articlesearch.json".into()
}
fn default_api_key_env() -> String {
    "NEWSWIRE_API_KEY".into()
}
fn default_keywords() -> Vec<String> {
    vec!["Election".into(), "Stock".into(), "Covid".into()]
}
fn default_page_count() -> u32 {
    50
}
fn default_start_date() -> String {
    "20200101".into()
}
fn default_end_date() -> String {
    "20241231".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_cooldown_secs() -> u64 {
    10
}

impl SearchSection {
    /// Parse and validate the configured date window.
    pub fn date_range(&self) -> Result<DateRange> {
        DateRange::parse(&self.start_date, &self.end_date)
    }
}

/// `[staging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingSection {
    /// Object-store endpoint. Overridable for emulators and tests.
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,

    /// Cloud project billed for requests; sent as `x-goog-user-project`
    /// when non-empty.
    #[serde(default)]
    pub project_id: String,

    /// Destination bucket.
    #[serde(default)]
    pub bucket: String,

    /// Staged object name; overwritten on every fetch run.
    #[serde(default = "default_object_name")]
    pub object_name: String,

    /// Name of the env var holding a bearer token for the store.
    /// The token is optional (emulators and public buckets need none).
    #[serde(default = "default_storage_token_env")]
    pub token_env: String,
}

impl Default for StagingSection {
    fn default() -> Self {
        Self {
            endpoint: default_storage_endpoint(),
            project_id: String::new(),
            bucket: String::new(),
            object_name: default_object_name(),
            token_env: default_storage_token_env(),
        }
    }
}

fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".into()
}
fn default_object_name() -> String {
    "articles.json".into()
}
fn default_storage_token_env() -> String {
    "NEWSWIRE_STORAGE_TOKEN".into()
}

impl StagingSection {
    /// Check that a staging destination is fully specified.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(NewswireError::validation(
                "staging bucket is not configured (set [staging].bucket or --bucket)",
            ));
        }
        if self.object_name.is_empty() {
            return Err(NewswireError::validation(
                "staging object name is not configured (set [staging].object_name or --object)",
            ));
        }
        Ok(())
    }
}

/// `[load]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSection {
    /// Name of the env var holding the database connection URI.
    #[serde(default = "default_db_uri_env")]
    pub uri_env: String,

    /// Target database name.
    #[serde(default)]
    pub database: String,

    /// Target collection name.
    #[serde(default)]
    pub collection: String,
}

impl Default for LoadSection {
    fn default() -> Self {
        Self {
            uri_env: default_db_uri_env(),
            database: String::new(),
            collection: String::new(),
        }
    }
}

fn default_db_uri_env() -> String {
    "NEWSWIRE_MONGO_URI".into()
}

impl LoadSection {
    /// Check that a load destination is fully specified.
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(NewswireError::validation(
                "load database is not configured (set [load].database or --database)",
            ));
        }
        if self.collection.is_empty() {
            return Err(NewswireError::validation(
                "load collection is not configured (set [load].collection or --collection)",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newswire/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewswireError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newswire/newswire.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does
/// not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewswireError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NewswireError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NewswireError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewswireError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewswireError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Credential resolution
// ---------------------------------------------------------------------------

/// Resolve the search API key from the env var named in config.
pub fn resolve_api_key(config: &SearchSection) -> Result<String> {
    let var_name = &config.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(NewswireError::config(format!(
            "search API key not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Resolve the optional object-store bearer token.
pub fn resolve_storage_token(config: &StagingSection) -> Option<String> {
    match std::env::var(&config.token_env) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => {
            tracing::debug!(var = %config.token_env, "no storage token set, sending unauthenticated requests");
            None
        }
    }
}

/// Resolve the database connection URI from the env var named in config.
pub fn resolve_db_uri(config: &LoadSection) -> Result<String> {
    let var_name = &config.uri_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(NewswireError::config(format!(
            "database URI not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("articlesearch.json"));
        assert!(toml_str.contains("NEWSWIRE_API_KEY"));
        assert!(toml_str.contains("articles.json"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.search.page_count, 50);
        assert_eq!(parsed.search.keywords, vec!["Election", "Stock", "Covid"]);
        assert_eq!(parsed.staging.object_name, "articles.json");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[search]
keywords = ["Climate"]
page_count = 2

[staging]
bucket = "news-staging"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.search.keywords, vec!["Climate"]);
        assert_eq!(config.search.page_count, 2);
        assert_eq!(config.search.start_date, "20200101");
        assert_eq!(config.staging.bucket, "news-staging");
        assert_eq!(config.staging.object_name, "articles.json");
        assert_eq!(config.load.uri_env, "NEWSWIRE_MONGO_URI");
    }

    #[test]
    fn date_window_parses_from_section() {
        let section = SearchSection::default();
        let range = section.date_range().expect("default dates parse");
        assert_eq!(range.begin_param(), "20200101");
        assert_eq!(range.end_param(), "20241231");
    }

    #[test]
    fn staging_validation_requires_destination() {
        let section = StagingSection::default();
        let err = section.validate().unwrap_err();
        assert!(err.to_string().contains("bucket"));

        let section = StagingSection {
            bucket: "news-staging".into(),
            object_name: String::new(),
            ..StagingSection::default()
        };
        let err = section.validate().unwrap_err();
        assert!(err.to_string().contains("object name"));
    }

    #[test]
    fn load_validation_requires_destination() {
        let err = LoadSection::default().validate().unwrap_err();
        assert!(err.to_string().contains("database"));
    }

    #[test]
    fn api_key_resolution_fails_when_unset() {
        let section = SearchSection {
            // Unique env var name to avoid interfering with other tests
            api_key_env: "NEWSWIRE_TEST_NONEXISTENT_KEY_12345".into(),
            ..SearchSection::default()
        };
        let result = resolve_api_key(&section);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
