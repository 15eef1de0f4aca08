//! Shared types, error model, and configuration for newswire.
//!
//! This crate is the foundation depended on by all other newswire crates.
//! It provides:
//! - [`NewswireError`] — the unified error type
//! - Domain types ([`AggregatedBatch`], [`DateRange`], [`RunId`], [`ResultRecord`])
//! - Configuration ([`AppConfig`], config loading, credential resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LoadSection, SearchSection, StagingSection, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key, resolve_db_uri,
    resolve_storage_token,
};
pub use error::{NewswireError, Result};
pub use types::{AggregatedBatch, DATE_WIRE_FORMAT, DateRange, ResultRecord, RunId};
