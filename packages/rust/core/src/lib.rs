//! Pipeline driver for newswire.
//!
//! Ties query enumeration, harvesting, staging, and loading into the two
//! externally invocable stages:
//! - [`pipeline::fetch_and_stage`] — harvest → aggregate → stage
//! - [`pipeline::load`] — read staged batch → bulk insert

pub mod pipeline;

pub use pipeline::{
    FetchStageConfig, FetchStageReport, LoadConfig, LoadReport, ProgressReporter, SilentProgress,
    fetch_and_stage, load,
};
