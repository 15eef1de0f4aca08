//! Search API harvesting: query enumeration, the one-shot paginated
//! fetcher, and order-preserving aggregation.
//!
//! This crate provides:
//! - [`query`] — Keyword × page expansion into fetch descriptors
//! - [`client`] — HTTP fetcher with the absorb-and-cooldown failure policy
//! - [`harvest`] — Sequential aggregation of all descriptor results

pub mod client;
pub mod harvest;
pub mod query;

pub use client::{FetchOutcome, SearchClient, SearchOptions};
pub use harvest::{HarvestObserver, HarvestReport, SilentHarvest, harvest};
pub use query::{QueryDescriptor, QueryPlan};
