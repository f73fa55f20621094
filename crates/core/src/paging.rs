//! Page planning for the repository search endpoint
//!
//! The export endpoint returns every matching document in one response unless
//! `rows`/`start` are supplied. Large collections are split into consecutive
//! windows so no single request asks for more than `page_size` documents.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Error type for page planning
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Page size must be greater than zero")]
    ZeroPageSize,
}

/// Search response envelope returned by the export endpoint
///
/// Documents decode as [`Record`] by default; the shell decodes them as raw
/// JSON values when it has to keep them verbatim.
#[derive(Debug, Deserialize, Clone)]
pub struct SearchResponse<D = Record> {
    pub response: SearchBody<D>,
}

/// Body of a search response
#[derive(Debug, Deserialize, Clone)]
pub struct SearchBody<D = Record> {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default = "Vec::new")]
    pub docs: Vec<D>,
}

/// One bounded sub-query
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u64,
    /// Number of documents this window actually covers
    pub size: u64,
    pub url: String,
}

/// Result of planning a query against a known total
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PagePlan {
    /// The whole result set fits in one request; the endpoint is unmodified
    Single(String),
    /// Start-ascending windows covering `[0, total)` without gap or overlap
    Windows(Vec<PageWindow>),
}

impl PagePlan {
    /// URLs to request, in order.
    ///
    /// A single-request plan is bounded by `total` through a `rows` parameter.
    pub fn request_urls(&self, total: u64) -> Vec<String> {
        match self {
            PagePlan::Single(endpoint) => vec![bounded_url(endpoint, total)],
            PagePlan::Windows(windows) => windows.iter().map(|w| w.url.clone()).collect(),
        }
    }

    pub fn request_count(&self) -> usize {
        match self {
            PagePlan::Single(_) => 1,
            PagePlan::Windows(windows) => windows.len(),
        }
    }
}

/// Split `[0, total)` into bounded windows of `page_size` documents
///
/// Returns the unmodified endpoint when `total <= page_size`. Otherwise every
/// window URL carries `rows=page_size&start=offset`; the last window covers
/// `total % page_size` documents and a window starting at `total` is never
/// emitted.
pub fn plan_pages(endpoint: &str, total: u64, page_size: u64) -> Result<PagePlan, PlanError> {
    if page_size == 0 {
        return Err(PlanError::ZeroPageSize);
    }

    if total <= page_size {
        return Ok(PagePlan::Single(endpoint.to_string()));
    }

    let rows = page_size.to_string();
    let windows = (0..)
        .map(|index: u64| index * page_size)
        .take_while(|start| *start < total)
        .map(|start| PageWindow {
            start,
            size: page_size.min(total - start),
            url: with_query(endpoint, &[("rows", rows.as_str()), ("start", &start.to_string())]),
        })
        .collect();

    Ok(PagePlan::Windows(windows))
}

/// Bound a single request to `total` rows unless it already names a row count
pub fn bounded_url(endpoint: &str, total: u64) -> String {
    if endpoint.contains("rows=") {
        return endpoint.to_string();
    }
    with_query(endpoint, &[("rows", &total.to_string())])
}

/// Append query parameters, respecting an existing query string
pub fn with_query(endpoint: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return endpoint.to_string();
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{query}")
}
