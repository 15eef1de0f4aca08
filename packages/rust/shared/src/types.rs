//! Core domain types for the newswire pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NewswireError, Result};

/// Wire format for dates on the search API query string (`begin_date`,
/// `end_date`) and in configuration files.
pub const DATE_WIRE_FORMAT: &str = "%Y%m%d";

// ---------------------------------------------------------------------------
// ResultRecord
// ---------------------------------------------------------------------------

/// One record as returned by the search API: an opaque, schema-free JSON
/// object passed through the pipeline unmodified. No field is ever inspected
/// or validated; `serde_json`'s `preserve_order` feature keeps the field
/// order as received so the staged payload is byte-stable per record.
pub type ResultRecord = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// AggregatedBatch
// ---------------------------------------------------------------------------

/// The ordered accumulation of all records harvested in one fetch run.
///
/// Ordering invariant: keyword order, then page order within keyword, then
/// within-page response order. Descriptors whose fetch failed contribute
/// zero records, so `len()` equals the sum of records over successful
/// descriptors only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedBatch {
    /// Records in fetch order.
    pub records: Vec<ResultRecord>,
}

impl AggregatedBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no descriptor contributed any records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<ResultRecord>> for AggregatedBatch {
    fn from(records: Vec<ResultRecord>) -> Self {
        Self { records }
    }
}

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// Inclusive calendar-date window applied to every search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(NewswireError::validation(format!(
                "start_date {} is after end_date {}",
                start.format(DATE_WIRE_FORMAT),
                end.format(DATE_WIRE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `YYYYMMDD` strings (the API's own format).
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse_one = |s: &str| {
            NaiveDate::parse_from_str(s, DATE_WIRE_FORMAT).map_err(|e| {
                NewswireError::validation(format!("invalid date '{s}' (expected YYYYMMDD): {e}"))
            })
        };
        Self::new(parse_one(start)?, parse_one(end)?)
    }

    /// The `begin_date` query-parameter value.
    pub fn begin_param(&self) -> String {
        self.start.format(DATE_WIRE_FORMAT).to_string()
    }

    /// The `end_date` query-parameter value.
    pub fn end_param(&self) -> String {
        self.end.format(DATE_WIRE_FORMAT).to_string()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.begin_param(), self.end_param())
    }
}

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline-stage invocation
/// (time-sortable, used in logs and run reports).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
