//! Query enumeration: expands keywords × pages × date window into an
//! ordered sequence of fetch descriptors.

use newswire_shared::DateRange;

// ---------------------------------------------------------------------------
// QueryDescriptor
// ---------------------------------------------------------------------------

/// One unit of fetch work: a single keyword/page request against the
/// search API. Immutable once created; consumed exactly once by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    /// Search keyword (the `q` parameter).
    pub keyword: String,
    /// 0-based page index.
    pub page: u32,
    /// Inclusive date window applied to every request.
    pub date_range: DateRange,
    /// API key passed through as a query parameter.
    pub api_key: String,
}

// ---------------------------------------------------------------------------
// QueryPlan
// ---------------------------------------------------------------------------

/// The full set of queries for one harvest run.
///
/// Enumeration order is fixed: all pages of one keyword (ascending from 0)
/// before moving to the next keyword. The aggregated output inherits this
/// order, so it must not change.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    keywords: Vec<String>,
    page_count: u32,
    date_range: DateRange,
    api_key: String,
}

impl QueryPlan {
    /// Create a plan over `keywords` × pages `0..page_count`.
    pub fn new(
        keywords: Vec<String>,
        page_count: u32,
        date_range: DateRange,
        api_key: String,
    ) -> Self {
        Self {
            keywords,
            page_count,
            date_range,
            api_key,
        }
    }

    /// Total number of descriptors the plan will produce.
    pub fn len(&self) -> usize {
        self.keywords.len() * self.page_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazy, restartable iterator over all descriptors in enumeration order.
    /// Pure; no I/O happens until a descriptor is handed to the client.
    pub fn descriptors(&self) -> impl Iterator<Item = QueryDescriptor> + '_ {
        self.keywords.iter().flat_map(move |keyword| {
            (0..self.page_count).map(move |page| QueryDescriptor {
                keyword: keyword.clone(),
                page,
                date_range: self.date_range,
                api_key: self.api_key.clone(),
            })
        })
    }
}
