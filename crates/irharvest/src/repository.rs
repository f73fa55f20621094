//! HTTP access to the repository export endpoint

use std::future::Future;

use irharvest_core::paging::SearchResponse;
use log::debug;
use serde_json::Value;

use crate::prelude::*;

/// Somewhere search envelopes can be fetched from
///
/// Documents are returned undecoded so callers can keep the raw JSON.
pub trait SearchSource {
    /// Export URL of one collection
    fn collection_endpoint(&self, pid: &str) -> String;

    /// GET one URL and decode the search envelope
    fn fetch(&self, url: &str) -> impl Future<Output = Result<SearchResponse<Value>>>;

    /// `numFound` of an unpaged request to `endpoint`
    fn total_count(&self, endpoint: &str) -> impl Future<Output = Result<u64>> {
        async move {
            let response = self.fetch(endpoint).await?;
            Ok(response.response.num_found)
        }
    }
}

/// Client for the collection export endpoint
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    client: reqwest::Client,
    api_base: String,
}

impl RepositoryClient {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }
}

impl SearchSource for RepositoryClient {
    fn collection_endpoint(&self, pid: &str) -> String {
        format!("{}{pid}", self.api_base)
    }

    async fn fetch(&self, url: &str) -> Result<SearchResponse<Value>> {
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{url}: HTTP {status}")).into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("{url}: failed to read response body: {e}")))?;

        let parsed = serde_json::from_str(&body)
            .map_err(|e| Error::Fetch(format!("{url}: invalid search response: {e}")))?;

        Ok(parsed)
    }
}
